//! In-memory storage for tests and ephemeral sessions.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::RwLock;

use super::{Storage, StorageError};

/// In-memory storage backend.
///
/// Uses a BTreeMap for deterministic iteration order. An optional byte quota
/// mimics browser local-storage limits, and writes can be switched off to
/// exercise degraded paths.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
    read_only: AtomicBool,
}

impl InMemoryStorage {
    /// Create a new empty store with no quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes pushing total size past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Get all keys.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Overwrite a raw value, bypassing quota checks. Useful to plant corrupt payloads.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }
}

impl Storage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("storage is read-only".to_string()));
        }

        let mut entries = self.entries.write();
        if let Some(quota) = self.quota {
            let current: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(current);
            if needed > available {
                return Err(StorageError::QuotaExceeded { needed, available });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("storage is read-only".to_string()));
        }
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = InMemoryStorage::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_remove() {
        let store = InMemoryStorage::new();
        store.set("a", "1").unwrap();
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_quota() {
        let store = InMemoryStorage::with_quota(10);
        store.set("k", "12345").unwrap();
        // Overwriting the same key only counts the new value.
        store.set("k", "123456789").unwrap();
        let err = store.set("other", "xxxxxx").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.get("k").unwrap(), Some("123456789".to_string()));
    }

    #[test]
    fn test_read_only() {
        let store = InMemoryStorage::new();
        store.set_read_only(true);
        assert!(store.set("a", "1").is_err());
        store.set_read_only(false);
        assert!(store.set("a", "1").is_ok());
    }
}
