//! Error types for the maps client.

use thiserror::Error;

/// Errors that can occur when querying the mapping service.
#[derive(Debug, Error)]
pub enum MapsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with an error status in its body.
    #[error("maps API error: {status}{}", message.as_deref().map(|m| format!(" - {}", m)).unwrap_or_default())]
    Api {
        status: String,
        message: Option<String>,
    },

    /// Invalid response from the service.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
