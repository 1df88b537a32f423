//! Locale codes

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

const MAX_LEN: usize = 35;

/// Validated locale code such as `pt`, `en` or `pt-BR`
///
/// Only ASCII letters, digits, `_` and `-` are allowed, so a code can be
/// embedded in a storage key or file name as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Validate a locale code
    ///
    /// # Errors
    /// Returns [`PersistenceError::InvalidLocale`] if the code is empty, too
    /// long or contains other characters
    pub fn new(code: impl Into<String>) -> Result<Self, PersistenceError> {
        let code = code.into();
        let valid = !code.is_empty()
            && code.len() <= MAX_LEN
            && code
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if valid {
            Ok(Self(code))
        } else {
            Err(PersistenceError::InvalidLocale(code))
        }
    }

    /// Code as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Label used when nothing better is known
    #[must_use]
    pub fn default_label(&self) -> String {
        self.0.to_uppercase()
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Locale {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = PersistenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Entry of the known-locales index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleEntry {
    /// Locale code
    pub code: Locale,
    /// Display label
    pub label: String,
}
