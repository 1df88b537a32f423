//! Structure introspection
//!
//! Walks a document and describes every location the form can edit:
//!
//! - top-level scalars become fields of the personal section
//! - top-level arrays become lists, top-level objects personal subsections
//! - each entry of the section map becomes a section; inside it scalars are
//!   fields, arrays are lists and objects are subsections
//!
//! Objects nested deeper than a subsection and arrays of arrays are left
//! untouched in the document and skipped here.

use std::collections::HashSet;

use serde_json::{Map, Value};
use vitae_path::PathExpression;

use crate::config::IntrospectionConfig;
use crate::descriptor::{
    DescriptorTree, FieldDescriptor, ItemField, ItemShape, ListDescriptor, SectionDescriptor,
    SectionId, SubsectionDescriptor,
};
use crate::error::{json_type, StructureError};
use crate::kind::{humanize, FieldKind};
use crate::value::{walk, FieldValue, ShapeVisitor};

/// Derives a [`DescriptorTree`] from a document's shape
#[derive(Debug, Clone, Default)]
pub struct StructureIntrospector {
    config: IntrospectionConfig,
}

impl StructureIntrospector {
    /// Create introspector with configuration
    #[inline]
    #[must_use]
    pub fn new(config: IntrospectionConfig) -> Self {
        Self { config }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &IntrospectionConfig {
        &self.config
    }

    /// Analyze a document
    ///
    /// # Errors
    /// Returns [`StructureError`] if the root, the section map or a section
    /// body is not an object
    pub fn analyze(&self, doc: &Value) -> Result<DescriptorTree, StructureError> {
        let root = doc.as_object().ok_or(StructureError::NotAnObject {
            found: json_type(doc),
        })?;

        let mut personal = Collector::new(self, None, Depth::Top);
        walk(root, &mut personal)?;

        let mut sections = vec![SectionDescriptor {
            id: SectionId::Personal,
            title: self.config.personal_title.clone(),
            fields: personal.fields,
            lists: personal.lists,
            subsections: personal.subsections,
        }];

        if let Some(key) = self.config.section_keys.iter().find(|k| root.contains_key(*k)) {
            let map = root[key].as_object().ok_or_else(|| StructureError::InvalidSectionMap {
                key: key.clone(),
                found: json_type(&root[key]),
            })?;
            let base = PathExpression::single(key.clone());
            for (section_key, body) in map {
                sections.push(self.section(&base, section_key, body)?);
            }
        }

        let tree = DescriptorTree { sections };
        check_unique(&tree)?;

        tracing::debug!(
            sections = tree.sections.len(),
            fields = tree.fields().count(),
            lists = tree.lists().count(),
            "Analyzed document structure"
        );
        Ok(tree)
    }

    fn section(
        &self,
        base: &PathExpression,
        key: &str,
        body: &Value,
    ) -> Result<SectionDescriptor, StructureError> {
        let map = body.as_object().ok_or_else(|| StructureError::InvalidSection {
            key: key.to_string(),
            found: json_type(body),
        })?;

        let title = self
            .config
            .title_keys
            .iter()
            .find_map(|k| map.get(k).and_then(Value::as_str))
            .map_or_else(|| humanize(key), str::to_string);

        let path = base.child(key);
        let mut collector = Collector::new(self, Some(path), Depth::Section(key));
        walk(map, &mut collector)?;

        Ok(SectionDescriptor {
            id: SectionId::named(key),
            title,
            fields: collector.fields,
            lists: collector.lists,
            subsections: collector.subsections,
        })
    }

    fn list(
        &self,
        path: PathExpression,
        name: &str,
        section: Option<&str>,
        items: &[Value],
    ) -> Option<ListDescriptor> {
        let shape = match items.first().map(FieldValue::classify) {
            None => self.config.shape_for_empty(name, section),
            Some(FieldValue::Scalar(_)) => ItemShape::Scalar,
            Some(FieldValue::Object(first)) => {
                let fields: Vec<ItemField> = first
                    .iter()
                    .filter(|(_, v)| FieldValue::classify(v).is_scalar())
                    .map(|(k, v)| {
                        ItemField::new(k.clone(), FieldKind::infer(k, Some(v)), self.config.is_item_required(k))
                    })
                    .collect();
                if fields.is_empty() {
                    self.config.shape_for_empty(name, section)
                } else {
                    ItemShape::Fields(fields)
                }
            }
            Some(FieldValue::Array(_)) => {
                tracing::debug!(path = %path, "Skipping array of arrays");
                return None;
            }
        };

        Some(ListDescriptor {
            label: humanize(name),
            path,
            shape,
            items: items.to_vec(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Depth<'a> {
    /// Document root
    Top,
    /// Body of the named section
    Section(&'a str),
    /// Object nested inside a section (or the root)
    Subsection(Option<&'a str>),
}

/// Gathers descriptors for the entries of one object
struct Collector<'i, 'a> {
    introspector: &'i StructureIntrospector,
    base: Option<PathExpression>,
    depth: Depth<'a>,
    fields: Vec<FieldDescriptor>,
    lists: Vec<ListDescriptor>,
    subsections: Vec<SubsectionDescriptor>,
}

impl<'i, 'a> Collector<'i, 'a> {
    fn new(introspector: &'i StructureIntrospector, base: Option<PathExpression>, depth: Depth<'a>) -> Self {
        Self {
            introspector,
            base,
            depth,
            fields: Vec::new(),
            lists: Vec::new(),
            subsections: Vec::new(),
        }
    }

    fn path(&self, key: &str) -> PathExpression {
        match &self.base {
            Some(base) => base.child(key),
            None => PathExpression::single(key),
        }
    }

    fn section_name(&self) -> Option<&'a str> {
        match self.depth {
            Depth::Top => None,
            Depth::Section(name) => Some(name),
            Depth::Subsection(name) => name,
        }
    }

    fn config(&self) -> &'i IntrospectionConfig {
        &self.introspector.config
    }
}

impl<'i, 'a> ShapeVisitor<'a> for Collector<'i, 'a> {
    type Error = StructureError;

    fn visit_scalar(&mut self, key: &'a str, value: &'a Value) -> Result<(), StructureError> {
        let required = match self.depth {
            Depth::Top if self.config().is_section_key(key) => return Ok(()),
            Depth::Top => self.config().is_required(key),
            Depth::Section(_) if self.config().is_title_key(key) => return Ok(()),
            Depth::Section(_) | Depth::Subsection(_) => false,
        };
        let kind = FieldKind::infer(key, Some(value));
        self.fields.push(FieldDescriptor::new(self.path(key), kind, required));
        Ok(())
    }

    fn visit_object(&mut self, key: &'a str, map: &'a Map<String, Value>) -> Result<(), StructureError> {
        let parent = match self.depth {
            Depth::Top if self.config().is_section_key(key) => return Ok(()),
            Depth::Top => None,
            Depth::Section(name) => Some(name),
            Depth::Subsection(_) => {
                tracing::debug!(path = %self.path(key), "Skipping object nested below a subsection");
                return Ok(());
            }
        };

        let path = self.path(key);
        let mut nested = Collector::new(self.introspector, Some(path.clone()), Depth::Subsection(parent));
        walk(map, &mut nested)?;

        self.subsections.push(SubsectionDescriptor {
            path,
            title: humanize(key),
            fields: nested.fields,
            lists: nested.lists,
        });
        Ok(())
    }

    fn visit_array(&mut self, key: &'a str, items: &'a [Value]) -> Result<(), StructureError> {
        if matches!(self.depth, Depth::Top) && self.config().is_section_key(key) {
            return Ok(());
        }
        let section = self.section_name();
        if let Some(list) = self.introspector.list(self.path(key), key, section, items) {
            self.lists.push(list);
        }
        Ok(())
    }
}

fn check_unique(tree: &DescriptorTree) -> Result<(), StructureError> {
    let mut seen = HashSet::new();
    let paths = tree
        .fields()
        .map(|f| &f.path)
        .chain(tree.lists().map(|l| &l.path));
    for path in paths {
        if !seen.insert(path) {
            return Err(StructureError::DuplicatePath(path.clone()));
        }
    }
    Ok(())
}
