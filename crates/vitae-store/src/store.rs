//! Locale-keyed snapshot cache
//!
//! Documents live under `<prefix><locale>`; an index of known locales and
//! their display labels lives under `<prefix>locales`. Every public write
//! either completes or leaves the previously stored values in place.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{FileBackend, MemoryBackend, StorageBackend};
use crate::bundle::{ExportBundle, LocaleLabel};
use crate::error::PersistenceError;
use crate::locale::{Locale, LocaleEntry};
use crate::snapshot::Snapshot;

/// Default key prefix
pub const DEFAULT_PREFIX: &str = "vitae_";

const INDEX_SUFFIX: &str = "locales";
const LABEL_KEY: &str = "languageName";

/// Where and how the local cache is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Prefix of every storage key
    pub prefix: String,
    /// Directory for a file-backed cache; in-memory when unset
    pub directory: Option<PathBuf>,
    /// Byte quota for the in-memory backend
    pub quota_bytes: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            directory: None,
            quota_bytes: None,
        }
    }
}

impl StorageConfig {
    /// Set key prefix
    #[inline]
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Store files under `dir`
    #[inline]
    #[must_use]
    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    /// Limit the in-memory backend to `bytes`
    #[inline]
    #[must_use]
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Open the configured store
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be created
    pub fn open(&self) -> Result<LocalStore, PersistenceError> {
        let backend: Arc<dyn StorageBackend> = match (&self.directory, self.quota_bytes) {
            (Some(dir), _) => Arc::new(FileBackend::open(dir.clone())?),
            (None, Some(quota)) => Arc::new(MemoryBackend::with_quota(quota)),
            (None, None) => Arc::new(MemoryBackend::new()),
        };
        Ok(LocalStore::new(backend).with_prefix(self.prefix.clone()))
    }
}

/// Per-locale document cache over a [`StorageBackend`]
#[derive(Debug, Clone)]
pub struct LocalStore {
    backend: Arc<dyn StorageBackend>,
    prefix: String,
}

impl LocalStore {
    /// Create store over a backend with the default prefix
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Create store over a fresh unbounded memory backend
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Set key prefix
    #[inline]
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Underlying backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn doc_key(&self, locale: &Locale) -> Result<String, PersistenceError> {
        if locale.as_str() == INDEX_SUFFIX {
            return Err(PersistenceError::InvalidLocale(locale.to_string()));
        }
        Ok(format!("{}{}", self.prefix, locale))
    }

    fn index_key(&self) -> String {
        format!("{}{INDEX_SUFFIX}", self.prefix)
    }

    fn read_index(&self) -> Result<IndexMap<String, LocaleLabel>, PersistenceError> {
        let key = self.index_key();
        match self.backend.get(&key)? {
            None => Ok(IndexMap::new()),
            Some(text) => serde_json::from_str(&text).map_err(|e| PersistenceError::Corrupt {
                key,
                message: e.to_string(),
            }),
        }
    }

    fn write_index(&self, index: &IndexMap<String, LocaleLabel>) -> Result<(), PersistenceError> {
        let text = serde_json::to_string(index).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        self.backend.set(&self.index_key(), &text)
    }

    /// Put the previous raw value back after a failed multi-key write
    fn restore(&self, key: &str, previous: Option<&str>) {
        let result = match previous {
            Some(value) => self.backend.set(key, value),
            None => self.backend.remove(key),
        };
        if let Err(err) = result {
            tracing::error!(key, error = %err, "Failed to restore previous value");
        }
    }

    /// Store `document` for `locale` and record it in the index
    ///
    /// # Errors
    /// Returns [`PersistenceError`] if either write fails; the previously
    /// stored document and index are then unchanged
    pub fn put(&self, locale: &Locale, document: &Value) -> Result<Snapshot, PersistenceError> {
        let key = self.doc_key(locale)?;
        let text = serde_json::to_string(document).map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let previous = self.backend.get(&key)?;
        self.backend.set(&key, &text)?;

        let indexed = self.read_index().and_then(|mut index| {
            let existing = index.get(locale.as_str()).map(|l| l.label.as_str());
            let label = label_for(locale, document, existing);
            index.insert(locale.to_string(), LocaleLabel { label });
            self.write_index(&index)
        });
        if let Err(err) = indexed {
            tracing::warn!(locale = %locale, error = %err, "Index write failed, restoring document");
            self.restore(&key, previous.as_deref());
            return Err(err);
        }

        tracing::info!(locale = %locale, bytes = text.len(), "Stored snapshot");
        Ok(Snapshot::new(locale.clone(), document.clone()))
    }

    /// Load the snapshot for `locale`
    ///
    /// # Errors
    /// Returns [`PersistenceError::Corrupt`] if the stored text does not parse
    pub fn get(&self, locale: &Locale) -> Result<Option<Snapshot>, PersistenceError> {
        let key = self.doc_key(locale)?;
        let Some(text) = self.backend.get(&key)? else {
            return Ok(None);
        };
        let document = serde_json::from_str(&text).map_err(|e| PersistenceError::Corrupt {
            key,
            message: e.to_string(),
        })?;
        Ok(Some(Snapshot::new(locale.clone(), document)))
    }

    /// Known locales in insertion order
    ///
    /// # Errors
    /// Returns error if the index cannot be read
    pub fn list_locales(&self) -> Result<Vec<LocaleEntry>, PersistenceError> {
        let index = self.read_index()?;
        let mut entries = Vec::with_capacity(index.len());
        for (code, meta) in index {
            match Locale::new(code) {
                Ok(code) => entries.push(LocaleEntry {
                    code,
                    label: meta.label,
                }),
                Err(err) => tracing::warn!(error = %err, "Skipping invalid index entry"),
            }
        }
        Ok(entries)
    }

    /// Remove every key under this store's prefix; returns documents removed
    ///
    /// # Errors
    /// Returns error on backend failure
    pub fn clear_all(&self) -> Result<usize, PersistenceError> {
        let index_key = self.index_key();
        let mut removed = 0;
        for key in self.backend.keys()? {
            if !key.starts_with(&self.prefix) {
                continue;
            }
            self.backend.remove(&key)?;
            if key != index_key {
                removed += 1;
            }
        }
        tracing::info!(removed, "Cleared local store");
        Ok(removed)
    }

    /// Collect every indexed document into a bundle
    ///
    /// # Errors
    /// Returns error if the index or a document cannot be read
    pub fn export_all(&self) -> Result<ExportBundle, PersistenceError> {
        let mut bundle = ExportBundle::default();
        for entry in self.list_locales()? {
            let Some(snapshot) = self.get(&entry.code)? else {
                tracing::warn!(locale = %entry.code, "Indexed locale has no document");
                continue;
            };
            let code = entry.code.to_string();
            bundle.locales.insert(code.clone(), LocaleLabel { label: entry.label });
            bundle.documents.insert(code, snapshot.document);
        }
        Ok(bundle)
    }

    /// Merge a bundle into the store
    ///
    /// Locales in the bundle overwrite stored ones; other stored locales are
    /// left alone. On failure every document already written is restored.
    ///
    /// # Errors
    /// Returns error if a locale code is invalid or a write fails
    pub fn import_all(&self, bundle: &ExportBundle) -> Result<Vec<Locale>, PersistenceError> {
        let mut entries = Vec::with_capacity(bundle.documents.len());
        for (code, document) in &bundle.documents {
            let locale = Locale::new(code.clone())?;
            let key = self.doc_key(&locale)?;
            let text = serde_json::to_string(document).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
            entries.push((locale, key, text, document));
        }

        let mut index = self.read_index()?;
        let mut touched: Vec<(String, Option<String>)> = Vec::new();
        let written = entries.iter().try_for_each(|(locale, key, text, document)| {
            let previous = self.backend.get(key)?;
            self.backend.set(key, text)?;
            touched.push((key.clone(), previous));

            let label = match bundle.label(locale.as_str()) {
                Some(label) => label.to_string(),
                None => {
                    let existing = index.get(locale.as_str()).map(|l| l.label.as_str());
                    label_for(locale, document, existing)
                }
            };
            index.insert(locale.to_string(), LocaleLabel { label });
            Ok::<(), PersistenceError>(())
        });

        if let Err(err) = written.and_then(|()| self.write_index(&index)) {
            tracing::warn!(error = %err, restored = touched.len(), "Import failed, rolling back");
            for (key, previous) in touched.iter().rev() {
                self.restore(key, previous.as_deref());
            }
            return Err(err);
        }

        let locales: Vec<Locale> = entries.into_iter().map(|(locale, ..)| locale).collect();
        tracing::info!(count = locales.len(), "Imported bundle");
        Ok(locales)
    }
}

fn label_for(locale: &Locale, document: &Value, existing: Option<&str>) -> String {
    document
        .get(LABEL_KEY)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or(existing)
        .map_or_else(|| locale.default_label(), str::to_string)
}
