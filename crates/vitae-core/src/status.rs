//! User-facing status messages

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    /// Action completed
    Success,
    /// Neutral progress
    Info,
    /// Needs attention but nothing was lost
    Warning,
    /// Action failed
    Danger,
}

/// One entry of the controller's outbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Severity
    pub level: StatusLevel,
    /// Text shown to the user
    pub text: String,
}

impl StatusMessage {
    /// Create message
    #[must_use]
    pub fn new(level: StatusLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// Success message
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Success, text)
    }

    /// Info message
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Info, text)
    }

    /// Warning message
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Warning, text)
    }

    /// Danger message
    #[must_use]
    pub fn danger(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Danger, text)
    }
}

impl Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            StatusLevel::Success => "ok",
            StatusLevel::Info => "info",
            StatusLevel::Warning => "warn",
            StatusLevel::Danger => "error",
        };
        write!(f, "[{tag}] {}", self.text)
    }
}
