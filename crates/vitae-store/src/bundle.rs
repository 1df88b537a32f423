//! Export bundles
//!
//! File format moved between machines:
//! `{"locales": {"pt": {"label": "Português"}}, "documents": {"pt": {...}}}`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PersistenceError;

/// Index metadata for one locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleLabel {
    /// Display label
    pub label: String,
}

/// Every cached locale and document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    /// Locale index
    #[serde(default)]
    pub locales: IndexMap<String, LocaleLabel>,
    /// Documents by locale code
    #[serde(default)]
    pub documents: IndexMap<String, Value>,
}

impl ExportBundle {
    /// Parse a bundle from JSON text
    ///
    /// # Errors
    /// Returns [`PersistenceError::Corrupt`] if the text is not a bundle
    pub fn from_json(text: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(text).map_err(|e| PersistenceError::Corrupt {
            key: "bundle".to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize as pretty JSON
    ///
    /// # Errors
    /// Returns [`PersistenceError::Serialization`] if serialization fails
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string_pretty(self).map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    /// Number of documents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True if the bundle carries no documents
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Label recorded for `code`
    #[must_use]
    pub fn label(&self, code: &str) -> Option<&str> {
        self.locales.get(code).map(|l| l.label.as_str())
    }
}
