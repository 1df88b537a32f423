//! Error types for introspection and form editing

use thiserror::Error;
use vitae_path::{PathError, PathExpression};

/// Document shape cannot be mapped onto a form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    /// Document root is not an object
    #[error("document root must be an object, found {found}")]
    NotAnObject {
        /// JSON type that was found
        found: &'static str,
    },

    /// Section map key holds something other than an object
    #[error("section map '{key}' must be an object, found {found}")]
    InvalidSectionMap {
        /// Reserved key
        key: String,
        /// JSON type that was found
        found: &'static str,
    },

    /// Section body is not an object
    #[error("section '{key}' must be an object, found {found}")]
    InvalidSection {
        /// Section key
        key: String,
        /// JSON type that was found
        found: &'static str,
    },

    /// Two descriptors ended up at the same location
    #[error("duplicate path in descriptor tree: {0}")]
    DuplicatePath(PathExpression),
}

/// List operation failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// No list registered at path
    #[error("no list at {0}")]
    UnknownList(PathExpression),

    /// Item index past the end
    #[error("index {index} out of range for {list} (len {len})")]
    IndexOutOfRange {
        /// List path
        list: PathExpression,
        /// Requested index
        index: usize,
        /// Current length
        len: usize,
    },

    /// Item has no field with that key
    #[error("list {list} has no item field '{key}'")]
    UnknownItemField {
        /// List path
        list: PathExpression,
        /// Requested key
        key: String,
    },
}

/// Form session operation failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Document could not be analyzed
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// List operation failed
    #[error(transparent)]
    List(#[from] ListError),

    /// Malformed path
    #[error(transparent)]
    Path(#[from] PathError),

    /// No bound field at path
    #[error("no field at {0}")]
    UnknownField(PathExpression),

    /// No section with that id
    #[error("no section '{0}'")]
    UnknownSection(String),
}

/// Configuration could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {message}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        message: String,
    },

    /// Content could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// Name of a JSON value's type, for error messages
#[must_use]
pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
