//! Vitae editor core
//!
//! Drives a form session from user intents and reconciles the local cache
//! with a remote document store.
//!
//! # Core Concepts
//!
//! - [`EditorController`]: synchronous state machine owning the session
//! - [`Intent`] in, [`Effect`] out, [`Completion`] back
//! - [`EditorRuntime`]: executes effects on tokio and feeds completions back
//! - [`RemoteStore`]: async remote collaborator ([`MemoryRemote`], `HttpRemote`
//!   with the `http` feature)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use vitae_core::{EditorConfig, EditorController, EditorRuntime, Intent, MemoryRemote};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pt = "pt".parse().unwrap();
//! let remote = MemoryRemote::new().with_document(&pt, json!({"name": "Ana"}));
//! let controller = EditorController::from_config(&EditorConfig::default()).unwrap();
//! let mut runtime = EditorRuntime::new(controller, Arc::new(remote));
//!
//! runtime.dispatch(Intent::SwitchLocale(pt)).unwrap();
//! runtime.settle().await;
//!
//! let session = runtime.controller().session().unwrap();
//! assert_eq!(session.document()["name"], json!("Ana"));
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod controller;
mod error;
#[cfg(feature = "http")]
mod http;
mod intent;
mod remote;
mod runtime;
mod status;

pub use config::{EditorConfig, RemoteConfig};
pub use controller::EditorController;
pub use error::{EditorError, NetworkError};
#[cfg(feature = "http")]
pub use http::HttpRemote;
pub use intent::{Completion, Effect, Intent, Ticket};
pub use remote::{MemoryRemote, RemoteStore, SaveOutcome};
pub use runtime::EditorRuntime;
pub use status::{StatusLevel, StatusMessage};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
