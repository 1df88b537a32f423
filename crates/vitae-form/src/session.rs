//! Editable form sessions
//!
//! A [`FormSession`] owns a working copy of one document together with the
//! descriptor tree derived from it. Edits land in the bound fields and are
//! mirrored into the working copy; [`FormSession::extract_document`] folds
//! the list states back in and returns the result.

use indexmap::IndexMap;
use serde_json::Value;
use vitae_path::{get, set, PathExpression};

use crate::descriptor::{DescriptorTree, SectionDescriptor, SectionId};
use crate::error::{FormError, ListError};
use crate::introspect::StructureIntrospector;
use crate::list::{BoundField, ListController, ListState};
use crate::validation::ValidationIssue;

/// Builds form sessions from documents
#[derive(Debug, Clone, Default)]
pub struct FormSynthesizer {
    introspector: StructureIntrospector,
}

impl FormSynthesizer {
    /// Create synthesizer around an introspector
    #[inline]
    #[must_use]
    pub fn new(introspector: StructureIntrospector) -> Self {
        Self { introspector }
    }

    /// Get introspector
    #[inline]
    #[must_use]
    pub fn introspector(&self) -> &StructureIntrospector {
        &self.introspector
    }

    /// Analyze `document` and bind a session to it
    ///
    /// # Errors
    /// Returns [`FormError::Structure`] if the document cannot be analyzed
    pub fn synthesize(&self, document: Value) -> Result<FormSession, FormError> {
        let tree = self.introspector.analyze(&document)?;
        Ok(FormSession::bind(tree, document))
    }
}

/// One document being edited
#[derive(Debug, Clone, PartialEq)]
pub struct FormSession {
    document: Value,
    tree: DescriptorTree,
    active: usize,
    fields: IndexMap<PathExpression, BoundField>,
    lists: ListController,
    unmatched: Vec<ValidationIssue>,
}

impl FormSession {
    /// Bind a descriptor tree to the document it was derived from
    #[must_use]
    pub fn bind(tree: DescriptorTree, document: Value) -> Self {
        let mut fields = IndexMap::new();
        for descriptor in tree.fields() {
            let bound = match get(&document, &descriptor.path).found() {
                Some(value) => BoundField::new(descriptor.clone(), value.clone()),
                None => BoundField::blank(descriptor.clone()),
            };
            fields.insert(descriptor.path.clone(), bound);
        }

        let mut lists = ListController::new();
        for list in tree.lists() {
            lists.register(list);
        }

        Self {
            document,
            tree,
            active: 0,
            fields,
            lists,
            unmatched: Vec::new(),
        }
    }

    /// Descriptor tree
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &DescriptorTree {
        &self.tree
    }

    /// Live document
    ///
    /// Plain field edits are visible here at once; list contents only after
    /// [`extract_document`](Self::extract_document).
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Sections in display order
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[SectionDescriptor] {
        &self.tree.sections
    }

    /// Currently displayed section
    #[must_use]
    pub fn active_section(&self) -> &SectionDescriptor {
        // The personal section always exists
        &self.tree.sections[self.active]
    }

    /// Display another section
    ///
    /// # Errors
    /// Returns [`FormError::UnknownSection`] if no section has that id
    pub fn switch_section(&mut self, id: &SectionId) -> Result<(), FormError> {
        let position = self
            .tree
            .sections
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| FormError::UnknownSection(id.to_string()))?;
        self.active = position;
        Ok(())
    }

    /// Plain (non-list) bound fields in document order
    pub fn fields(&self) -> impl Iterator<Item = &BoundField> {
        self.fields.values()
    }

    /// Plain bound fields of one section, subsections included
    ///
    /// # Errors
    /// Returns [`FormError::UnknownSection`] if no section has that id
    pub fn section_fields(&self, id: &SectionId) -> Result<Vec<&BoundField>, FormError> {
        let section = self
            .tree
            .section(id)
            .ok_or_else(|| FormError::UnknownSection(id.to_string()))?;
        Ok(section
            .all_fields()
            .filter_map(|d| self.fields.get(&d.path))
            .collect())
    }

    /// Bound field by path, list item fields included
    #[must_use]
    pub fn field(&self, path: &PathExpression) -> Option<&BoundField> {
        self.fields.get(path).or_else(|| self.lists.field(path))
    }

    /// Current value at a field path
    #[must_use]
    pub fn value(&self, path: &PathExpression) -> Option<&Value> {
        self.field(path).map(BoundField::value)
    }

    /// All lists
    #[inline]
    #[must_use]
    pub fn lists(&self) -> &ListController {
        &self.lists
    }

    /// List by path
    #[must_use]
    pub fn list(&self, path: &PathExpression) -> Option<&ListState> {
        self.lists.get(path)
    }

    /// Change the value of a field
    ///
    /// Plain fields are written through to the working document straight
    /// away; list item fields are folded in on extraction.
    ///
    /// # Errors
    /// Returns [`FormError::UnknownField`] if nothing is bound at `path`
    pub fn edit(&mut self, path: &PathExpression, value: Value) -> Result<(), FormError> {
        if let Some(field) = self.fields.get_mut(path) {
            field.set_value(value.clone());
            field.set_issue(None);
            set(&mut self.document, path, value);
            return Ok(());
        }

        match self.lists.field_mut(path) {
            Ok(field) => {
                field.set_value(value);
                field.set_issue(None);
                Ok(())
            }
            Err(ListError::UnknownList(_) | ListError::UnknownItemField { .. }) => {
                Err(FormError::UnknownField(path.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Append an item to a list
    ///
    /// # Errors
    /// Returns [`FormError::List`] if no list is at `list`
    pub fn add_item(&mut self, list: &PathExpression, defaults: Option<&Value>) -> Result<usize, FormError> {
        Ok(self.lists.add_item(list, defaults)?)
    }

    /// Remove an item from a list
    ///
    /// # Errors
    /// Returns [`FormError::List`] if the list is unknown or the index out of
    /// range
    pub fn remove_item(&mut self, list: &PathExpression, index: usize) -> Result<(), FormError> {
        self.lists.remove_item(list, index)?;
        Ok(())
    }

    /// Fold the form state into the working document and return a copy
    ///
    /// Repeated calls without edits in between return equal documents.
    pub fn extract_document(&mut self) -> Value {
        for field in self.fields.values() {
            set(&mut self.document, field.path(), field.value().clone());
        }
        for list in self.lists.iter() {
            set(&mut self.document, list.path(), Value::Array(list.extract()));
        }
        self.document.clone()
    }

    /// Paths of required fields that are still empty, in form order
    #[must_use]
    pub fn missing_required(&self) -> Vec<PathExpression> {
        let plain = self.fields.values();
        let items = self
            .lists
            .iter()
            .flat_map(|l| l.items().iter())
            .filter(|item| !item.is_blank())
            .flat_map(|item| item.fields().iter());
        plain
            .chain(items)
            .filter(|f| f.is_missing())
            .map(|f| f.path().clone())
            .collect()
    }

    /// Attach validation issues to the fields they name
    ///
    /// Issues whose location does not match any bound field are kept at
    /// session level. Returns the number of issues attached to fields.
    pub fn apply_validation_issues(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) -> usize {
        let mut attached = 0;
        for issue in issues {
            let Some(path) = issue.target() else {
                self.unmatched.push(issue);
                continue;
            };
            let field = match self.fields.get_mut(&path) {
                Some(field) => Some(field),
                None => self.lists.field_mut(&path).ok(),
            };
            match field {
                Some(field) => {
                    field.set_issue(Some(issue.message));
                    attached += 1;
                }
                None => self.unmatched.push(issue),
            }
        }
        tracing::debug!(attached, unmatched = self.unmatched.len(), "Applied validation issues");
        attached
    }

    /// Remove all validation messages
    pub fn clear_validation_issues(&mut self) {
        for field in self.fields.values_mut() {
            field.set_issue(None);
        }
        for list in self.lists.iter_mut() {
            list.clear_issues();
        }
        self.unmatched.clear();
    }

    /// Issues that matched no field
    #[inline]
    #[must_use]
    pub fn unmatched_issues(&self) -> &[ValidationIssue] {
        &self.unmatched
    }

    /// Fields currently carrying a validation message
    pub fn issues(&self) -> impl Iterator<Item = &BoundField> {
        let items = self
            .lists
            .iter()
            .flat_map(|l| l.items().iter())
            .flat_map(|item| item.fields().iter());
        self.fields.values().chain(items).filter(|f| f.issue().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn path(s: &str) -> PathExpression {
        s.parse().unwrap()
    }

    fn session(doc: Value) -> FormSession {
        FormSynthesizer::default().synthesize(doc).unwrap()
    }

    #[test]
    fn edit_plain_field_updates_document() {
        let mut s = session(json!({"name": "", "email": "a@b.c"}));
        s.edit(&path("name"), json!("Ana")).unwrap();
        assert_eq!(s.value(&path("name")), Some(&json!("Ana")));
        assert_eq!(s.extract_document(), json!({"name": "Ana", "email": "a@b.c"}));
    }

    #[test]
    fn edit_list_item_field() {
        let mut s = session(json!({"sections": {"exp": {"jobs": [{"company": "A"}]}}}));
        s.edit(&path("sections.exp.jobs[0].company"), json!("B")).unwrap();
        assert_eq!(
            s.extract_document()["sections"]["exp"]["jobs"],
            json!([{"company": "B"}])
        );
    }

    #[test]
    fn edit_unknown_field() {
        let mut s = session(json!({"name": ""}));
        assert_eq!(
            s.edit(&path("nickname"), json!("x")),
            Err(FormError::UnknownField(path("nickname")))
        );
        assert!(matches!(
            s.edit(&path("jobs[0].company"), json!("x")),
            Err(FormError::UnknownField(_))
        ));
    }

    #[test]
    fn switch_sections() {
        let mut s = session(json!({"name": "", "sections": {"about": {"text": ""}}}));
        assert_eq!(s.active_section().id, SectionId::Personal);
        s.switch_section(&SectionId::named("about")).unwrap();
        assert_eq!(s.active_section().title, "About");
        assert_eq!(
            s.switch_section(&SectionId::named("nope")),
            Err(FormError::UnknownSection("nope".into()))
        );
        assert_eq!(s.active_section().title, "About");
    }

    #[test]
    fn missing_required_ignores_blank_items() {
        let mut s = session(json!({
            "name": "",
            "email": "a@b.c",
            "sections": {"exp": {"jobs": [{"company": "", "title": "Dev"}]}}
        }));
        s.add_item(&path("sections.exp.jobs"), None).unwrap();

        assert_eq!(
            s.missing_required(),
            vec![path("name"), path("sections.exp.jobs[0].company")]
        );
    }

    #[test]
    fn validation_issues_attach_by_pointer() {
        let mut s = session(json!({"email": "x", "jobs": [{"company": "A"}]}));
        let attached = s.apply_validation_issues(vec![
            ValidationIssue::new("/email", "not an e-mail"),
            ValidationIssue::new("/jobs/0/company", "too short"),
            ValidationIssue::new("/phone", "required"),
            ValidationIssue::new("", "document invalid"),
        ]);

        assert_eq!(attached, 2);
        assert_eq!(s.field(&path("email")).unwrap().issue(), Some("not an e-mail"));
        assert_eq!(
            s.field(&path("jobs[0].company")).unwrap().issue(),
            Some("too short")
        );
        assert_eq!(s.unmatched_issues().len(), 2);
        assert_eq!(s.issues().count(), 2);

        s.edit(&path("email"), json!("a@b.c")).unwrap();
        assert_eq!(s.field(&path("email")).unwrap().issue(), None);

        s.clear_validation_issues();
        assert_eq!(s.issues().count(), 0);
        assert!(s.unmatched_issues().is_empty());
    }

    #[test]
    fn section_fields_include_subsections() {
        let s = session(json!({
            "sections": {"about": {"title": "About me", "intro": {"text": "hi"}, "motto": "x"}}
        }));
        let paths: Vec<String> = s
            .section_fields(&SectionId::named("about"))
            .unwrap()
            .iter()
            .map(|f| f.path().to_string())
            .collect();
        assert_eq!(paths, vec!["sections.about.motto", "sections.about.intro.text"]);
    }
}
