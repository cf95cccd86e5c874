//! Durable key-value store for ledger and quota snapshots.
//!
//! The trait is synchronous on purpose: ledger mutations must not suspend,
//! so snapshot writes happen inline with the mutation. Values are JSON
//! strings; the typed helpers in [`PersistenceStoreExt`] go through
//! `serde_json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Durable key-value store surviving session reloads.
pub trait PersistenceStore: Send + Sync {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PersistenceResult<()>;
    fn delete(&self, key: &str) -> PersistenceResult<()>;
}

/// Typed load/store over any [`PersistenceStore`].
pub trait PersistenceStoreExt {
    fn load<T: DeserializeOwned>(&self, key: &str) -> PersistenceResult<Option<T>>;
    fn store<T: Serialize>(&self, key: &str, value: &T) -> PersistenceResult<()>;
}

impl<S: PersistenceStore + ?Sized> PersistenceStoreExt for S {
    fn load<T: DeserializeOwned>(&self, key: &str) -> PersistenceResult<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) -> PersistenceResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

/// In-memory store, for tests and guest sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceStore for MemoryStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PersistenceResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> PersistenceResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// Filesystem-backed store: one JSON file per key under a base directory.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Keys map directly to filenames, so restrict them to a safe alphabet.
    fn key_to_path(&self, key: &str) -> PersistenceResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl PersistenceStore for FileStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        let path = self.key_to_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> PersistenceResult<()> {
        let path = self.key_to_path(key)?;
        // Write-then-rename keeps each persisted snapshot self-consistent.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> PersistenceResult<()> {
        let path = self.key_to_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        count: u32,
        name: String,
    }

    #[test]
    fn memory_store_set_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn typed_round_trip() {
        let store = MemoryStore::new();
        let snapshot = Snapshot {
            count: 7,
            name: "weekly".into(),
        };
        store.store("snapshot", &snapshot).unwrap();
        let back: Option<Snapshot> = store.load("snapshot").unwrap();
        assert_eq!(back, Some(snapshot));
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        store.set("ledger-v1", "{\"a\":1}").unwrap();
        assert_eq!(
            store.get("ledger-v1").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        store.delete("ledger-v1").unwrap();
        assert_eq!(store.get("ledger-v1").unwrap(), None);
        // Deleting a missing key is fine.
        store.delete("ledger-v1").unwrap();
    }

    #[test]
    fn file_store_rejects_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(PersistenceError::InvalidKey(_))
        ));
        assert!(matches!(
            store.get(""),
            Err(PersistenceError::InvalidKey(_))
        ));
    }
}
