//! Maps web service client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::types::{DirectionsResponse, GeocodeResponse};
use crate::{DirectionsRequest, MapsError, Route, TravelTime};

/// Default base URL of the maps web service.
pub const DEFAULT_MAPS_URL: &str = "https://maps.googleapis.com";

const GEOCODE_PATH: &str = "/maps/api/geocode/json";
const DIRECTIONS_PATH: &str = "/maps/api/directions/json";

/// Queries the evaluator makes against the mapping service.
#[async_trait]
pub trait Maps: Send + Sync {
    /// Place identifiers for a coordinate pair, best candidate first.
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<String>, MapsError>;

    /// Transit route alternatives between two place identifiers.
    async fn directions(&self, request: &DirectionsRequest) -> Result<Vec<Route>, MapsError>;
}

/// Client for the Google Maps web service API.
pub struct MapsClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl MapsClient {
    /// Create a client against [`DEFAULT_MAPS_URL`].
    pub fn new(api_key: impl Into<String>) -> Result<Self, MapsError> {
        Self::with_base_url(DEFAULT_MAPS_URL, api_key)
    }

    /// Create a client against a custom base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, MapsError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, MapsError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MapsError::InvalidResponse(format!(
                "request failed ({}): {}",
                status, text
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// `OK` and `ZERO_RESULTS` are both successful answers.
    fn check_api_status(status: &str, message: Option<String>) -> Result<(), MapsError> {
        match status {
            "OK" | "ZERO_RESULTS" => Ok(()),
            other => Err(MapsError::Api {
                status: other.to_string(),
                message,
            }),
        }
    }
}

#[async_trait]
impl Maps for MapsClient {
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<String>, MapsError> {
        let body = self
            .get(
                GEOCODE_PATH,
                &[("latlng", format!("{},{}", latitude, longitude))],
            )
            .await?;
        let response: GeocodeResponse = serde_json::from_slice(&body)?;
        Self::check_api_status(&response.status, response.error_message)?;

        debug!(
            latitude,
            longitude,
            candidates = response.results.len(),
            "reverse geocoded"
        );
        Ok(response.results.into_iter().map(|r| r.place_id).collect())
    }

    async fn directions(&self, request: &DirectionsRequest) -> Result<Vec<Route>, MapsError> {
        let mut query = vec![
            ("origin", format!("place_id:{}", request.origin)),
            ("destination", format!("place_id:{}", request.destination)),
            ("mode", "transit".to_string()),
            ("alternatives", "true".to_string()),
        ];
        match request.time {
            TravelTime::ArriveBy(at) => query.push(("arrival_time", at.timestamp().to_string())),
            TravelTime::DepartAt(at) => {
                query.push(("departure_time", at.timestamp().to_string()))
            }
        }

        let body = self.get(DIRECTIONS_PATH, &query).await?;
        let response: DirectionsResponse = serde_json::from_slice(&body)?;
        Self::check_api_status(&response.status, response.error_message)?;

        debug!(
            origin = %request.origin,
            destination = %request.destination,
            routes = response.routes.len(),
            "fetched directions"
        );
        Ok(response.routes)
    }
}
