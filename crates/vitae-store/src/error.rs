//! Persistence errors

use thiserror::Error;

/// Local cache read or write failed
///
/// A failed write never leaves a partially updated value behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// Locale code cannot be used as a storage key
    #[error("invalid locale code '{0}'")]
    InvalidLocale(String),

    /// Backend has no room for the value
    #[error("quota exceeded writing '{key}': need {needed} bytes, {available} available")]
    QuotaExceeded {
        /// Storage key
        key: String,
        /// Bytes the write would occupy
        needed: usize,
        /// Bytes left under the quota
        available: usize,
    },

    /// Document could not be serialized
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Stored value no longer parses
    #[error("corrupt value at '{key}': {message}")]
    Corrupt {
        /// Storage key
        key: String,
        /// Parser message
        message: String,
    },

    /// Backend I/O failure
    #[error("backend failure at '{key}': {message}")]
    Backend {
        /// Storage key
        key: String,
        /// Underlying error
        message: String,
    },
}

impl PersistenceError {
    /// True if retrying the same operation may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. } | Self::Backend { .. })
    }

    pub(crate) fn backend(key: &str, err: impl std::fmt::Display) -> Self {
        Self::Backend {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}
