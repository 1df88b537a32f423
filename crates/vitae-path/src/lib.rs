//! Vitae path addressing
//!
//! Textual addressing of locations inside schema-less JSON documents.
//!
//! # Core Concepts
//!
//! - [`PathExpression`]: parsed `a.b[0].c` path, always non-empty
//! - [`get`]: lookup returning [`Resolved::Absent`] for missing locations
//! - [`set`]: auto-vivifying assignment that never fails for a valid path
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use vitae_path::{get, set, PathExpression, Resolved};
//!
//! let mut doc = json!({});
//! let path: PathExpression = "sections.experience.jobs[0].company".parse().unwrap();
//!
//! set(&mut doc, &path, json!("Acme"));
//! assert_eq!(get(&doc, &path), Resolved::Found(&json!("Acme")));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod path;
mod resolver;

pub use path::{PathError, PathExpression, Segment, MAX_INDEX};
pub use resolver::{get, get_str, set, set_str, Resolved};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
