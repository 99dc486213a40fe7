//! Request and response types for the mapping service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::MapsError;

/// Time constraint of a directions query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelTime {
    /// Arrive at the destination no later than this instant.
    ArriveBy(DateTime<Utc>),
    /// Leave the origin at this instant.
    DepartAt(DateTime<Utc>),
}

/// A transit directions query between two place identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionsRequest {
    pub origin: String,
    pub destination: String,
    pub time: TravelTime,
}

/// One alternative route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub legs: Vec<Leg>,
}

impl Route {
    fn first_leg(&self) -> Result<&Leg, MapsError> {
        self.legs
            .first()
            .ok_or_else(|| MapsError::InvalidResponse("route has no legs".to_string()))
    }

    /// Departure of the route's first leg.
    pub fn departure(&self) -> Result<&TimeValue, MapsError> {
        self.first_leg()?
            .departure_time
            .as_ref()
            .ok_or_else(|| MapsError::InvalidResponse("leg has no departure_time".to_string()))
    }

    /// Arrival of the route's first leg.
    pub fn arrival(&self) -> Result<&TimeValue, MapsError> {
        self.first_leg()?
            .arrival_time
            .as_ref()
            .ok_or_else(|| MapsError::InvalidResponse("leg has no arrival_time".to_string()))
    }
}

/// A route leg. Transit legs carry departure and arrival times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub departure_time: Option<TimeValue>,
    #[serde(default)]
    pub arrival_time: Option<TimeValue>,
}

/// A timestamp as reported by the directions service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeValue {
    /// Seconds since the Unix epoch.
    pub value: i64,
    /// IANA timezone the time is local to.
    pub time_zone: String,
}

impl TimeValue {
    /// The instant this value denotes.
    pub fn instant(&self) -> Result<DateTime<Utc>, MapsError> {
        DateTime::from_timestamp(self.value, 0).ok_or_else(|| {
            MapsError::InvalidResponse(format!("timestamp out of range: {}", self.value))
        })
    }
}

/// Body of a geocoding response.
#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResult {
    pub place_id: String,
}

/// Body of a directions response.
#[derive(Debug, Deserialize)]
pub(crate) struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
}
