//! File-backed storage: one JSON file per key inside a directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Storage, StorageError};

/// Stores each key as `<root>/<key>.json`.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the key files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to its file. Bytes outside `[A-Za-z0-9_-]` are
    /// percent-encoded, so distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut safe = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
                safe.push(char::from(byte));
            } else {
                safe.push_str(&format!("%{byte:02X}"));
            }
        }
        self.root.join(format!("{safe}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::open(dir.path()).unwrap();

        assert_eq!(store.get("snapshots").unwrap(), None);
        store.set("snapshots", "[]").unwrap();
        assert_eq!(store.get("snapshots").unwrap(), Some("[]".to_string()));
        assert!(dir.path().join("snapshots.json").exists());

        store.remove("snapshots").unwrap();
        store.remove("snapshots").unwrap();
        assert_eq!(store.get("snapshots").unwrap(), None);
    }

    #[test]
    fn test_key_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::open(dir.path()).unwrap();
        store.set("../escape", "x").unwrap();
        assert!(dir.path().join("%2E%2E%2Fescape.json").exists());
        assert_eq!(store.get("../escape").unwrap(), Some("x".to_string()));
    }

    #[test]
    fn test_distinct_keys_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::open(dir.path()).unwrap();
        store.set("a/b", "slash").unwrap();
        store.set("a_b", "underscore").unwrap();
        store.set("a%2Fb", "literal").unwrap();

        assert_eq!(store.get("a/b").unwrap(), Some("slash".to_string()));
        assert_eq!(store.get("a_b").unwrap(), Some("underscore".to_string()));
        assert_eq!(store.get("a%2Fb").unwrap(), Some("literal".to_string()));
    }
}
