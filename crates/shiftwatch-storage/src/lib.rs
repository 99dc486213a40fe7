//! Object storage for state that outlives a single run.
//!
//! Objects are opaque byte blobs addressed by a flat key such as
//! `session.json`. [`FsObjectStore`] keeps them as files in one directory;
//! [`MemoryObjectStore`] keeps them in memory.

mod error;
mod fs;
mod memory;

use async_trait::async_trait;

pub use error::StorageError;
pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

/// A flat key/value blob store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object, or `None` if it does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Create or overwrite an object.
    async fn put(&self, key: &str, content: &[u8]) -> Result<(), StorageError>;
}

/// Reject keys that could escape the store's namespace.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.contains('/') || key.contains('\\') || key == "." || key == ".." {
        return Err(StorageError::InvalidKey(format!(
            "key must be a plain file name: {}",
            key
        )));
    }
    Ok(())
}
