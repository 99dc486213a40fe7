//! Error types for the evaluation pipeline.

use shiftwatch_maps::MapsError;
use shiftwatch_marketplace::MarketplaceError;
use shiftwatch_notify::NotifyError;
use shiftwatch_storage::StorageError;
use thiserror::Error;

/// Errors that can end a run.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Marketplace request failed.
    #[error("marketplace error: {0}")]
    Marketplace(#[from] MarketplaceError),

    /// The marketplace rejected the account credentials.
    #[error("login failed: {0}")]
    LoginRejected(#[source] MarketplaceError),

    /// An operation needs a logged-in session.
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    /// Mapping service request failed.
    #[error("maps error: {0}")]
    Maps(#[from] MapsError),

    /// Reverse geocoding produced no place for a location.
    #[error("no place found for location {0}")]
    PlaceNotFound(String),

    /// Reading or writing persisted state failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Notifying subscribers failed.
    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Persisted session could not be decoded.
    #[error("invalid session: {0}")]
    InvalidSession(#[from] serde_json::Error),
}

impl CoreError {
    /// Render the error with its chain of causes, one per line.
    ///
    /// A cause whose text already appears in the message is skipped, since
    /// most variants print their source inline.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !out.contains(&text) {
                out.push_str("\ncaused by: ");
                out.push_str(&text);
            }
            source = cause.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_includes_causes() {
        let err = CoreError::LoginRejected(MarketplaceError::Status {
            endpoint: "login",
            status: 403,
            body: "nope".to_string(),
        });
        assert_eq!(err.report(), "login failed: login failed (403): nope");
    }

    #[test]
    fn test_report_names_each_cause_once() {
        let err = CoreError::Notify(NotifyError::Storage(StorageError::Io(
            std::io::Error::other("disk full"),
        )));

        let report = err.report();

        assert_eq!(report.matches("disk full").count(), 1);
        assert_eq!(report, "notification error: storage error: IO error: disk full");
    }

    #[test]
    fn test_report_appends_causes_missing_from_message() {
        #[derive(Debug, thiserror::Error)]
        #[error("connection refused")]
        struct Refused;

        #[derive(Debug, thiserror::Error)]
        #[error("error sending request")]
        struct SendFailed(#[source] Refused);

        let err = CoreError::Storage(StorageError::Io(std::io::Error::other(SendFailed(Refused))));

        assert_eq!(
            err.report(),
            "storage error: IO error: error sending request\ncaused by: connection refused"
        );
    }
}
