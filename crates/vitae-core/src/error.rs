//! Error types for the editor
//!
//! Form and path errors are programming or data problems and are reported
//! as-is. Persistence and network errors are recoverable: the in-memory
//! session survives them and the same intent can be retried.

use thiserror::Error;
use vitae_form::FormError;
use vitae_path::PathExpression;
use vitae_store::{Locale, PersistenceError};

/// Failure talking to the remote document store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// Connection could not be made
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    /// Remote answered with an error status
    #[error("remote returned {status}: {message}")]
    Status {
        /// HTTP-like status code
        status: u16,
        /// Error text from the response body
        message: String,
    },

    /// Body did not have the expected envelope
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request did not finish in time
    #[error("request timed out after {secs}s")]
    Timeout {
        /// Configured timeout
        secs: u64,
    },
}

/// Main editor error type
#[derive(Debug, Error)]
pub enum EditorError {
    /// Session operation failed
    #[error("form error: {0}")]
    Form(#[from] FormError),

    /// Local cache failure
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Remote store failure
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Edit attempted while a remote request for the locale is outstanding
    #[error("'{0}' is read-only while it loads")]
    ReadOnly(Locale),

    /// Another remote request is still outstanding
    #[error("a remote request is already in progress")]
    Busy,

    /// No locale has been loaded yet
    #[error("no document loaded")]
    NoSession,

    /// Save refused because required fields are empty
    #[error("required fields are empty: {}", join(.0))]
    MissingRequired(Vec<PathExpression>),

    /// Configuration could not be read
    #[error("configuration error: {0}")]
    Config(String),
}

fn join(paths: &[PathExpression]) -> String {
    paths.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl EditorError {
    /// True if retrying the same intent may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Network(_))
    }
}
