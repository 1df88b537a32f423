//! Validation issues reported against a document

use serde::{Deserialize, Serialize};
use vitae_path::PathExpression;

/// A problem with one location of a document
///
/// `path` is either a path expression (`jobs[0].company`) or a JSON pointer
/// (`/jobs/0/company`), which is what schema validators emit. An empty path
/// or `/` refers to the document as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Location of the problem
    pub path: String,
    /// Human-readable message
    pub message: String,
}

impl ValidationIssue {
    /// Create issue
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Location as a path expression, or `None` for document-level issues
    /// and unparseable locations
    #[must_use]
    pub fn target(&self) -> Option<PathExpression> {
        let path = self.path.trim();
        if path.is_empty() || path == "/" {
            return None;
        }
        if path.starts_with('/') {
            PathExpression::from_pointer(path).ok()
        } else {
            path.parse().ok()
        }
    }
}
