//! Wire types for the marketplace API.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Status value of a shift that is still open to the account.
pub const OFFERED_STATUS: &str = "offered";

/// Account credentials used for password login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// An OAuth access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Envelope returned by the login and refresh endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct OAuthResponse {
    pub oauth: TokenPair,
}

/// A job posting with its shifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub venue_name: String,
    pub role: Role,
    pub location: JobLocation,
    pub pay_rate: PayRate,
    pub shifts: Vec<Shift>,
}

impl Job {
    /// Human-readable label: `"{role}@{venue}, {city}"`.
    pub fn label(&self) -> String {
        format!(
            "{}@{}, {}",
            self.role.title, self.venue_name, self.location.address.city
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLocation {
    pub geo_location: GeoPoint,
    pub address: Address,
}

/// A latitude/longitude pair.
///
/// Coordinates are kept as JSON numbers. Their text form is the shortest one
/// that reads back as the same value, so it is stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: serde_json::Number,
    pub longitude: serde_json::Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
}

/// Hourly pay rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayRate {
    pub amount: f64,
}

/// A single bookable time slot within a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub status: String,
}

impl Shift {
    /// Whether the shift is still being offered to the account.
    pub fn is_offered(&self) -> bool {
        self.status == OFFERED_STATUS
    }
}

/// Identifiers arrive as numbers or strings; they are always handled as strings.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}
