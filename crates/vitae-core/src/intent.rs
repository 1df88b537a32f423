//! Messages into and out of the controller
//!
//! User actions arrive as [`Intent`]s. Handling one may request remote work,
//! returned as [`Effect`]s; the runtime performs it and feeds the answer back
//! as a [`Completion`] carrying the same [`Ticket`].

use std::fmt::{self, Display};

use serde_json::Value;
use vitae_form::SectionId;
use vitae_path::PathExpression;
use vitae_store::{Locale, Resolution};

use crate::error::NetworkError;
use crate::remote::SaveOutcome;

/// A user action
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Change one bound field
    EditField {
        /// Field location
        path: PathExpression,
        /// New value
        value: Value,
    },
    /// Append an item to a list
    AddItem {
        /// List location
        list: PathExpression,
        /// Initial item values
        defaults: Option<Value>,
    },
    /// Delete an item from a list
    RemoveItem {
        /// List location
        list: PathExpression,
        /// Item position
        index: usize,
    },
    /// Show another section
    SwitchSection(SectionId),
    /// Load another locale
    SwitchLocale(Locale),
    /// Persist to the local cache
    Save,
    /// Save locally, then compare with the remote copy
    Sync,
    /// Rebuild the form from the last loaded or saved document
    Reset,
    /// Settle a divergence
    Resolve(Resolution),
    /// Drop every locally cached document
    ClearLocal,
}

/// Identifies one remote request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

impl Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Remote work requested by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Read the remote document
    Fetch {
        /// Request id
        ticket: Ticket,
        /// Locale asked for
        locale: Locale,
    },
    /// Overwrite the remote document
    Push {
        /// Request id
        ticket: Ticket,
        /// Locale written
        locale: Locale,
        /// Document to store
        document: Value,
    },
}

impl Effect {
    /// Request id
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Fetch { ticket, .. } | Self::Push { ticket, .. } => *ticket,
        }
    }

    /// Locale the request is for
    #[must_use]
    pub fn locale(&self) -> &Locale {
        match self {
            Self::Fetch { locale, .. } | Self::Push { locale, .. } => locale,
        }
    }
}

/// Answer to an [`Effect`]
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Fetch finished
    Fetched {
        /// Request id
        ticket: Ticket,
        /// Locale asked for
        locale: Locale,
        /// Remote document, `None` if absent
        result: Result<Option<Value>, NetworkError>,
    },
    /// Push finished
    Pushed {
        /// Request id
        ticket: Ticket,
        /// Locale written
        locale: Locale,
        /// Remote verdict
        result: Result<SaveOutcome, NetworkError>,
    },
}

impl Completion {
    /// Request id
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Fetched { ticket, .. } | Self::Pushed { ticket, .. } => *ticket,
        }
    }

    /// Locale the request was for
    #[must_use]
    pub fn locale(&self) -> &Locale {
        match self {
            Self::Fetched { locale, .. } | Self::Pushed { locale, .. } => locale,
        }
    }
}
