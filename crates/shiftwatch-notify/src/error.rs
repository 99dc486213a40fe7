//! Error types for notification delivery.

use thiserror::Error;

/// Errors that can occur while notifying subscribers.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing the subscriber list failed.
    #[error("storage error: {0}")]
    Storage(#[from] shiftwatch_storage::StorageError),

    /// The push endpoint refused the message.
    #[error("push rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The push message could not be signed or encrypted.
    #[error("push message error: {0}")]
    Push(#[from] web_push::WebPushError),

    /// A subscription document is missing required fields.
    #[error("invalid subscription: {0}")]
    InvalidSubscription(String),
}

impl NotifyError {
    /// Whether the push service reports the subscription as gone for good
    /// (404 or 410). Other failures say nothing about the subscription.
    pub fn is_gone(&self) -> bool {
        matches!(self, NotifyError::Rejected { status: 404 | 410, .. })
    }
}
