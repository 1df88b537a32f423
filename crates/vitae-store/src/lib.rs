//! Vitae local store
//!
//! Locale-scoped document cache and local/remote reconciliation.
//!
//! # Core Concepts
//!
//! - [`LocalStore`]: per-locale snapshots plus an index of known locales
//! - [`StorageBackend`]: string key/value storage ([`MemoryBackend`], [`FileBackend`])
//! - [`ExportBundle`]: every locale and document, for moving between machines
//! - [`ReconciliationEngine`]: structural divergence and conflict advisories
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use vitae_store::{Locale, LocalStore};
//!
//! let store = LocalStore::in_memory();
//! let pt: Locale = "pt".parse().unwrap();
//!
//! store.put(&pt, &json!({"name": "Ana", "languageName": "Português"})).unwrap();
//! assert_eq!(store.list_locales().unwrap()[0].label, "Português");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod backend;
mod bundle;
mod error;
mod locale;
mod reconcile;
mod snapshot;
mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use bundle::{ExportBundle, LocaleLabel};
pub use error::PersistenceError;
pub use locale::{Locale, LocaleEntry};
pub use reconcile::{
    deep_equal, Reconciliation, ReconciliationConflict, ReconciliationEngine, ReconcileConfig,
    Resolution,
};
pub use snapshot::{canonical_json, fingerprint, Snapshot};
pub use store::{LocalStore, StorageConfig, DEFAULT_PREFIX};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
