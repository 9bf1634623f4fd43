//! File-backed session store
//!
//! All keys live in a single JSON document. Every mutation rewrites the
//! whole document from the in-memory map, so a reader never observes a
//! partially updated sequence.

use super::traits::SessionStore;
use crate::error::{RetraceError, RetraceResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Session store persisted as one JSON file on disk.
pub struct FileSessionStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileSessionStore {
    /// Open a store at the given path, loading any existing document.
    ///
    /// A missing file starts the store empty; an unreadable or corrupt
    /// document is discarded with a warning rather than failing the
    /// session.
    pub fn open(path: impl AsRef<Path>) -> RetraceResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "discarding corrupt session store");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Serialize the whole map and write it out.
    fn save(&self, entries: &HashMap<String, String>) -> RetraceResult<()> {
        let raw = serde_json::to_string(entries)?;
        fs::write(&self.path, raw).map_err(|e| RetraceError::StorageSaveFailed(e.to_string()))
    }
}

impl SessionStore for FileSessionStore {
    fn put(&self, key: &str, value: &str) -> RetraceResult<()> {
        let mut entries = self.entries.lock()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn get(&self, key: &str) -> RetraceResult<Option<String>> {
        Ok(self.entries.lock()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> RetraceResult<()> {
        let mut entries = self.entries.lock()?;
        entries.remove(key);
        self.save(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        {
            let store = FileSessionStore::open(&path).unwrap();
            store.put("flag", "true").unwrap();
            store.put("logs", "[]").unwrap();
        }

        let store = FileSessionStore::open(&path).unwrap();
        assert_eq!(store.get("flag").unwrap(), Some("true".to_string()));
        assert_eq!(store.get("logs").unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_delete_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        store.put("flag", "true").unwrap();
        store.delete("flag").unwrap();
        drop(store);

        let store = FileSessionStore::open(&path).unwrap();
        assert_eq!(store.get("flag").unwrap(), None);
    }

    #[test]
    fn test_corrupt_document_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileSessionStore::open(&path).unwrap();
        assert_eq!(store.get("flag").unwrap(), None);

        // The store stays usable after discarding the corrupt document
        store.put("flag", "true").unwrap();
        assert_eq!(store.get("flag").unwrap(), Some("true".to_string()));
    }

    #[test]
    fn test_missing_parent_directory_is_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        store.put("flag", "false").unwrap();
        assert!(path.exists());
    }
}
