//! Error types for object storage.

use thiserror::Error;

/// Errors from object storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid object key: {0}")]
    InvalidKey(String),
}
