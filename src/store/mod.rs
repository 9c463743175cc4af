//! Durable local storage backends.
//!
//! The kernel persists everything as JSON strings under a handful of logical
//! keys, the way a browser editor would use local storage. Backends only need
//! string get/set/remove; all structure lives above this boundary.

pub mod memory;
pub mod file;

use std::sync::Arc;

/// Error type for storage operations.
///
/// Storage failures never reach graph logic: callers log them and degrade
/// (reads fall back to empty, writes are dropped).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored payload could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Write would exceed the backend's capacity.
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        /// Bytes required by the write.
        needed: usize,
        /// Bytes still free.
        available: usize,
    },
    /// Backend is not usable (e.g. disabled or failing deliberately).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Trait for durable key/value storage backends.
///
/// Methods take `&self`; backends use interior mutability so a single
/// backend can be shared between the live-graph owner and the snapshot log.
pub trait Storage: Send + Sync {
    /// Read a value. `Ok(None)` means the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

pub use memory::InMemoryStorage;
pub use file::FileStorage;
