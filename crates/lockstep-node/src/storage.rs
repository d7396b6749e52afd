//! JSON snapshot storage.
//!
//! The whole escrow state is small enough to persist as a single document.
//! Saves go to a sibling temp file that is then renamed over the target, so
//! a crash mid-write leaves the previous snapshot intact.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use lockstep_core::error::StorageError;

/// A snapshot file on disk.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the snapshot, or `None` if nothing has been saved yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path).map_err(|e| io_error(&self.path, e))?;
        let value = serde_json::from_slice(&bytes).map_err(|e| StorageError::Decode(e.to_string()))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot loaded");
        Ok(Some(value))
    }

    /// Write `value` atomically, creating parent directories as needed.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| StorageError::Encode(e.to_string()))?;
        let tmp = self.temp_path();
        fs::write(&tmp, &bytes).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("escrow.json"));
        assert!(!store.exists());
        let loaded: Option<BTreeMap<String, u64>> = store.load().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested/escrow.json"));
        let mut value = BTreeMap::new();
        value.insert("positions".to_string(), 3u64);
        store.save(&value).unwrap();
        assert!(store.exists());
        let loaded: BTreeMap<String, u64> = store.load().unwrap().unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("escrow.json"));
        store.save(&vec![1u8, 2, 3]).unwrap();
        store.save(&vec![4u8]).unwrap();
        assert!(!dir.path().join("escrow.json.tmp").exists());
        let loaded: Vec<u8> = store.load().unwrap().unwrap();
        assert_eq!(loaded, vec![4]);
    }

    #[test]
    fn corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("escrow.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = SnapshotStore::new(path);
        let err = store.load::<Vec<u8>>().unwrap_err();
        assert!(matches!(err, StorageError::Decode(_)));
    }
}
