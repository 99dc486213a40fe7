//! Error types for the marketplace client.

use thiserror::Error;

/// Errors that can occur when talking to the marketplace.
#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// The server answered with a non-success status.
    #[error("{endpoint} failed ({status}): {body}")]
    Status {
        /// Short name of the endpoint that failed.
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid response from server.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl MarketplaceError {
    /// HTTP status carried by this error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            MarketplaceError::Status { status, .. } => Some(*status),
            MarketplaceError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the server rejected the credentials or token (401).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether the server answered with a non-success status, as opposed to
    /// the request failing in transit or the body not parsing.
    pub fn is_rejection(&self) -> bool {
        matches!(self, MarketplaceError::Status { .. })
    }
}
