//! Descriptors produced by structure introspection
//!
//! A [`DescriptorTree`] is pure data: it names every editable location in a
//! document and how to render it, without holding any of the values.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitae_path::PathExpression;

use crate::kind::{humanize, FieldKind};

/// Identifier of a form section
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    /// Synthetic section holding the document's top-level fields
    Personal,
    /// Entry of the section map, by key
    Named(String),
}

impl SectionId {
    /// Create a named section id
    #[inline]
    #[must_use]
    pub fn named(key: impl Into<String>) -> Self {
        Self::Named(key.into())
    }
}

impl Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personal => f.write_str("personal"),
            Self::Named(key) => f.write_str(key),
        }
    }
}

/// Editable leaf location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    /// Location in the document
    pub path: PathExpression,
    /// Display label
    pub label: String,
    /// Input kind
    pub kind: FieldKind,
    /// Must be non-empty before saving
    pub required: bool,
}

impl FieldDescriptor {
    /// Describe the field at `path`, labelling it from its last key
    #[must_use]
    pub fn new(path: PathExpression, kind: FieldKind, required: bool) -> Self {
        let label = humanize(path.last().name());
        Self {
            path,
            label,
            kind,
            required,
        }
    }
}

/// One field of a complex list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemField {
    /// Key inside the item object
    pub key: String,
    /// Display label; filled from the key when left empty
    #[serde(default)]
    pub label: String,
    /// Input kind
    #[serde(default)]
    pub kind: FieldKind,
    /// Must be non-empty before saving
    #[serde(default)]
    pub required: bool,
}

impl ItemField {
    /// Create item field with a label derived from `key`
    #[must_use]
    pub fn new(key: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        let key = key.into();
        Self {
            label: humanize(&key),
            key,
            kind,
            required,
        }
    }
}

/// Shape of the elements of a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemShape {
    /// Each element is a single scalar
    Scalar,
    /// Each element is an object with these scalar fields
    Fields(Vec<ItemField>),
}

impl ItemShape {
    /// Fill any empty labels from their keys
    #[must_use]
    pub fn labelled(mut self) -> Self {
        if let Self::Fields(fields) = &mut self {
            for field in fields.iter_mut().filter(|f| f.label.is_empty()) {
                field.label = humanize(&field.key);
            }
        }
        self
    }

    /// True for scalar lists
    #[inline]
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar)
    }
}

/// Array location whose elements share a shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListDescriptor {
    /// Location of the array
    pub path: PathExpression,
    /// Display label
    pub label: String,
    /// Element shape
    pub shape: ItemShape,
    /// Elements present when the document was analyzed
    pub items: Vec<Value>,
}

/// Nested object inside a section, rendered as a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsectionDescriptor {
    /// Location of the object
    pub path: PathExpression,
    /// Display title
    pub title: String,
    /// Scalar fields
    pub fields: Vec<FieldDescriptor>,
    /// Lists
    pub lists: Vec<ListDescriptor>,
}

/// One tab of the form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionDescriptor {
    /// Identifier
    pub id: SectionId,
    /// Display title
    pub title: String,
    /// Scalar fields
    pub fields: Vec<FieldDescriptor>,
    /// Lists
    pub lists: Vec<ListDescriptor>,
    /// Nested groups
    pub subsections: Vec<SubsectionDescriptor>,
}

impl SectionDescriptor {
    /// All fields, including those of subsections
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .chain(self.subsections.iter().flat_map(|s| s.fields.iter()))
    }

    /// All lists, including those of subsections
    pub fn all_lists(&self) -> impl Iterator<Item = &ListDescriptor> {
        self.lists
            .iter()
            .chain(self.subsections.iter().flat_map(|s| s.lists.iter()))
    }
}

/// Result of analyzing a document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DescriptorTree {
    /// Sections in display order, personal first
    pub sections: Vec<SectionDescriptor>,
}

impl DescriptorTree {
    /// Find section by id
    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&SectionDescriptor> {
        self.sections.iter().find(|s| &s.id == id)
    }

    /// Every field in the tree
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.sections.iter().flat_map(SectionDescriptor::all_fields)
    }

    /// Every list in the tree
    pub fn lists(&self) -> impl Iterator<Item = &ListDescriptor> {
        self.sections.iter().flat_map(SectionDescriptor::all_lists)
    }

    /// Find field by path
    #[must_use]
    pub fn field(&self, path: &PathExpression) -> Option<&FieldDescriptor> {
        self.fields().find(|f| &f.path == path)
    }

    /// Find list by path
    #[must_use]
    pub fn list(&self, path: &PathExpression) -> Option<&ListDescriptor> {
        self.lists().find(|l| &l.path == path)
    }
}
