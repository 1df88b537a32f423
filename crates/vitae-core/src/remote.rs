//! Remote document store
//!
//! The remote collaborator holds one document per locale and may reject a
//! save with a list of validation issues. Every call is async and is only
//! ever issued by the runtime, never from inside the controller.

use std::collections::BTreeMap;
use std::fmt::Debug;

use parking_lot::Mutex;
use serde_json::Value;
use vitae_form::ValidationIssue;
use vitae_store::Locale;

use crate::error::NetworkError;

/// Answer to a save request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Remote stored the document
    Accepted {
        /// Confirmation text
        message: String,
    },
    /// Remote refused the document
    Rejected(Vec<ValidationIssue>),
}

impl SaveOutcome {
    /// Accepted with a message
    #[must_use]
    pub fn accepted(message: impl Into<String>) -> Self {
        Self::Accepted {
            message: message.into(),
        }
    }
}

/// Async access to the remote copy of every locale
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync + Debug {
    /// Remote document for `locale`, `None` if the remote has none
    async fn fetch(&self, locale: &Locale) -> Result<Option<Value>, NetworkError>;

    /// Overwrite the remote document for `locale`
    async fn save(&self, locale: &Locale, document: &Value) -> Result<SaveOutcome, NetworkError>;

    /// Schema the external validator uses for `locale`
    async fn fetch_schema(&self, locale: &Locale) -> Result<Option<Value>, NetworkError>;
}

/// In-process remote, for offline use and tests
#[derive(Debug, Default)]
pub struct MemoryRemote {
    documents: Mutex<BTreeMap<String, Value>>,
    schemas: Mutex<BTreeMap<String, Value>>,
}

impl MemoryRemote {
    /// Create empty remote
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document
    #[must_use]
    pub fn with_document(self, locale: &Locale, document: Value) -> Self {
        self.insert(locale, document);
        self
    }

    /// Seed a schema
    #[must_use]
    pub fn with_schema(self, locale: &Locale, schema: Value) -> Self {
        self.schemas.lock().insert(locale.to_string(), schema);
        self
    }

    /// Replace a document
    pub fn insert(&self, locale: &Locale, document: Value) {
        self.documents.lock().insert(locale.to_string(), document);
    }

    /// Current document for `locale`
    #[must_use]
    pub fn document(&self, locale: &Locale) -> Option<Value> {
        self.documents.lock().get(locale.as_str()).cloned()
    }
}

#[async_trait::async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch(&self, locale: &Locale) -> Result<Option<Value>, NetworkError> {
        Ok(self.document(locale))
    }

    async fn save(&self, locale: &Locale, document: &Value) -> Result<SaveOutcome, NetworkError> {
        self.insert(locale, document.clone());
        Ok(SaveOutcome::accepted(format!("saved '{locale}'")))
    }

    async fn fetch_schema(&self, locale: &Locale) -> Result<Option<Value>, NetworkError> {
        Ok(self.schemas.lock().get(locale.as_str()).cloned())
    }
}
