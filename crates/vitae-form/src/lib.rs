//! Vitae forms
//!
//! Maps schema-less résumé documents onto editable forms.
//!
//! # Core Concepts
//!
//! - [`StructureIntrospector`]: derives a [`DescriptorTree`] from a document
//! - [`FormSynthesizer`]: binds a tree and its document into a [`FormSession`]
//! - [`ListController`]: add/remove/reindex/extract for repeated items
//! - [`IntrospectionConfig`]: reserved keys, required keys and alias shapes
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use vitae_form::{FormSynthesizer, SectionId};
//!
//! let doc = json!({
//!     "name": "",
//!     "sections": {"skills": {"items": ["rust", "sql"]}}
//! });
//! let mut session = FormSynthesizer::default().synthesize(doc).unwrap();
//!
//! session.edit(&"name".parse().unwrap(), json!("Ana")).unwrap();
//! session.remove_item(&"sections.skills.items".parse().unwrap(), 0).unwrap();
//!
//! let doc = session.extract_document();
//! assert_eq!(doc["name"], json!("Ana"));
//! assert_eq!(doc["sections"]["skills"]["items"], json!(["sql"]));
//! assert_eq!(session.sections()[1].id, SectionId::named("skills"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod descriptor;
mod error;
mod introspect;
mod kind;
mod list;
mod session;
mod validation;
mod value;

pub use config::{AliasGroup, IntrospectionConfig};
pub use descriptor::{
    DescriptorTree, FieldDescriptor, ItemField, ItemShape, ListDescriptor, SectionDescriptor,
    SectionId, SubsectionDescriptor,
};
pub use error::{ConfigError, FormError, ListError, StructureError};
pub use introspect::StructureIntrospector;
pub use kind::{humanize, normalize_name, FieldKind};
pub use list::{is_empty_value, BoundField, ItemHandle, ListController, ListState};
pub use session::{FormSession, FormSynthesizer};
pub use validation::ValidationIssue;
pub use value::{walk, FieldValue, ShapeVisitor};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
