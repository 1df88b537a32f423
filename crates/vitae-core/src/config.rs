//! Editor configuration
//!
//! One TOML file nests every component's settings:
//!
//! ```toml
//! [storage]
//! directory = "/home/ana/.cache/vitae"
//!
//! [introspection]
//! section_keys = ["sections"]
//!
//! [reconcile]
//! max_paths = 8
//!
//! [remote]
//! base_url = "http://localhost:5000"
//! timeout_secs = 10
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use vitae_form::IntrospectionConfig;
use vitae_store::{ReconcileConfig, StorageConfig};

use crate::error::EditorError;

/// Remote collaborator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Server root, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Complete editor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Local cache
    pub storage: StorageConfig,
    /// Document introspection
    pub introspection: IntrospectionConfig,
    /// Local/remote comparison
    pub reconcile: ReconcileConfig,
    /// Remote store
    pub remote: RemoteConfig,
}

impl EditorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set storage settings
    #[inline]
    #[must_use]
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Set introspection settings
    #[inline]
    #[must_use]
    pub fn with_introspection(mut self, introspection: IntrospectionConfig) -> Self {
        self.introspection = introspection;
        self
    }

    /// Set reconciliation settings
    #[inline]
    #[must_use]
    pub fn with_reconcile(mut self, reconcile: ReconcileConfig) -> Self {
        self.reconcile = reconcile;
        self
    }

    /// Set remote base URL
    #[inline]
    #[must_use]
    pub fn with_remote_url(mut self, base_url: impl Into<String>) -> Self {
        self.remote.base_url = base_url.into();
        self
    }

    /// Set remote timeout
    #[inline]
    #[must_use]
    pub fn with_remote_timeout(mut self, secs: u64) -> Self {
        self.remote.timeout_secs = secs;
        self
    }

    /// Read configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`EditorError::Config`] if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EditorError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EditorError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "Loading editor configuration");
        Self::from_toml(&text)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns [`EditorError::Config`] if the text is not valid configuration
    pub fn from_toml(text: &str) -> Result<Self, EditorError> {
        toml::from_str(text).map_err(|e| EditorError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = EditorConfig::from_toml(
            r#"
            [reconcile]
            max_paths = 4

            [remote]
            base_url = "https://cv.example.org"
            "#,
        )
        .unwrap();

        assert_eq!(config.reconcile.max_paths, 4);
        assert_eq!(config.remote.base_url, "https://cv.example.org");
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.storage, StorageConfig::default());
        assert_eq!(config.introspection, IntrospectionConfig::default());
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(
            EditorConfig::from_toml("[remote\nbase_url = 1"),
            Err(EditorError::Config(_))
        ));
    }

    #[test]
    fn builders() {
        let config = EditorConfig::new()
            .with_remote_url("http://127.0.0.1:8080")
            .with_remote_timeout(5)
            .with_reconcile(ReconcileConfig::default().with_max_paths(2));
        assert_eq!(config.remote.timeout_secs, 5);
        assert_eq!(config.reconcile.max_paths, 2);
    }
}
