//! String key/value storage backends
//!
//! The local store only needs what browser local storage offers: get, set
//! and remove of string values by key, plus key enumeration. A backend
//! either applies a write completely or not at all.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::error::PersistenceError;

/// String key/value storage
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Read value
    ///
    /// # Errors
    /// Returns error on backend failure
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Write value, replacing any previous one
    ///
    /// # Errors
    /// Returns error if the value cannot be stored; the previous value is
    /// then unchanged
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Delete value; deleting a missing key is not an error
    ///
    /// # Errors
    /// Returns error on backend failure
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;

    /// All stored keys
    ///
    /// # Errors
    /// Returns error on backend failure
    fn keys(&self) -> Result<Vec<String>, PersistenceError>;
}

/// In-memory backend with an optional byte quota
///
/// Usage counts the bytes of every key and value, like the browser quota
/// the store was modelled on.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Create unbounded backend
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create backend limited to `bytes`
    #[inline]
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota: Some(bytes),
        }
    }

    /// Bytes currently used
    #[must_use]
    pub fn usage(&self) -> usize {
        self.entries.lock().iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock();
        if let Some(quota) = self.quota {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(PersistenceError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}

const EXTENSION: &str = "json";

/// Backend storing one file per key in a directory
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers never observe a half-written value.
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open backend rooted at `dir`, creating the directory if needed
    ///
    /// # Errors
    /// Returns error if the directory cannot be created
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| PersistenceError::backend(&dir.display().to_string(), e))?;
        Ok(Self { dir })
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let safe = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
            && !key.starts_with('.');
        if !safe {
            return Err(PersistenceError::backend(key, "key is not usable as a file name"));
        }
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.file(key)?) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::backend(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let target = self.file(key)?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| PersistenceError::backend(key, e))?;
        tmp.write_all(value.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| PersistenceError::backend(key, e))?;
        tmp.persist(&target)
            .map_err(|e| PersistenceError::backend(key, e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.file(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::backend(key, e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        let key = self.dir.display().to_string();
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| PersistenceError::backend(&key, e))? {
            let path = entry.map_err(|e| PersistenceError::backend(&key, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_roundtrip() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("a").unwrap(), None);
        backend.set("a", "1").unwrap();
        backend.set("b", "2").unwrap();
        assert_eq!(backend.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(backend.keys().unwrap(), vec!["a", "b"]);
        backend.remove("a").unwrap();
        backend.remove("a").unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["b"]);
    }

    #[test]
    fn memory_quota_rejects_without_side_effects() {
        let backend = MemoryBackend::with_quota(10);
        backend.set("k", "12345").unwrap();
        assert_eq!(backend.usage(), 6);

        let err = backend.set("k", "1234567890").unwrap_err();
        assert_eq!(
            err,
            PersistenceError::QuotaExceeded {
                key: "k".into(),
                needed: 11,
                available: 10
            }
        );
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("12345"));

        backend.set("k", "123456789").unwrap();
        assert_eq!(backend.usage(), 10);
    }

    #[test]
    fn file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path().join("cache")).unwrap();

        backend.set("vitae_pt", "{\"name\":\"Ana\"}").unwrap();
        backend.set("vitae_locales", "{}").unwrap();
        backend.set("vitae_pt", "{\"name\":\"Bia\"}").unwrap();

        assert_eq!(backend.get("vitae_pt").unwrap().as_deref(), Some("{\"name\":\"Bia\"}"));
        assert_eq!(backend.keys().unwrap(), vec!["vitae_locales", "vitae_pt"]);

        backend.remove("vitae_pt").unwrap();
        assert_eq!(backend.get("vitae_pt").unwrap(), None);
    }

    #[test]
    fn file_backend_rejects_unsafe_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert!(backend.set("../escape", "x").is_err());
        assert!(backend.set("", "x").is_err());
    }
}
