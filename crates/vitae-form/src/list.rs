//! Dynamic list editing
//!
//! Each list in a form is a [`ListState`]: an ordered run of [`ItemHandle`]s
//! whose field paths always carry indices `0..len`. Removing an item
//! renumbers everything after it; extraction drops items the user left
//! blank.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use vitae_path::{PathExpression, Segment};

use crate::descriptor::{FieldDescriptor, ItemField, ItemShape, ListDescriptor};
use crate::error::ListError;
use crate::value::FieldValue;

/// True for values treated as "not filled in"
///
/// Null, whitespace-only strings and `false` are empty.
#[must_use]
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// A field descriptor together with its current value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundField {
    descriptor: FieldDescriptor,
    value: Value,
    issue: Option<String>,
}

impl BoundField {
    /// Bind a value to a descriptor
    #[must_use]
    pub fn new(descriptor: FieldDescriptor, value: Value) -> Self {
        Self {
            descriptor,
            value,
            issue: None,
        }
    }

    /// Bind the empty value for the descriptor's kind
    #[must_use]
    pub fn blank(descriptor: FieldDescriptor) -> Self {
        let value = descriptor.kind.empty_value();
        Self::new(descriptor, value)
    }

    /// Descriptor
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// Location in the document
    #[inline]
    #[must_use]
    pub fn path(&self) -> &PathExpression {
        &self.descriptor.path
    }

    /// Current value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Replace value
    #[inline]
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// True if the value is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        is_empty_value(&self.value)
    }

    /// Required and empty
    #[inline]
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.descriptor.required && self.is_empty()
    }

    /// Validation message attached to this field
    #[inline]
    #[must_use]
    pub fn issue(&self) -> Option<&str> {
        self.issue.as_deref()
    }

    /// Attach or clear a validation message
    #[inline]
    pub fn set_issue(&mut self, issue: Option<String>) {
        self.issue = issue;
    }

    fn relocate(&mut self, path: PathExpression) {
        self.descriptor.path = path;
    }
}

/// One element of a list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ItemHandle {
    /// Scalar element
    Simple {
        /// Position in the list
        index: usize,
        /// The element's value
        field: BoundField,
    },
    /// Object element
    Complex {
        /// Position in the list
        index: usize,
        /// One bound field per shape key
        fields: Vec<BoundField>,
        /// Keys of the original object not covered by the shape
        extras: Map<String, Value>,
    },
}

impl ItemHandle {
    fn simple(list: &PathExpression, index: usize, value: Value) -> Self {
        let descriptor = FieldDescriptor {
            path: list.item(index),
            label: format!("#{}", index + 1),
            kind: crate::FieldKind::Text,
            required: false,
        };
        Self::Simple {
            index,
            field: BoundField::new(descriptor, value),
        }
    }

    fn complex(list: &PathExpression, index: usize, shape: &[ItemField], source: Option<&Map<String, Value>>) -> Self {
        let base = list.item(index);
        let mut extras = source.cloned().unwrap_or_default();
        let mut fields = Vec::with_capacity(shape.len());

        for item_field in shape {
            let descriptor = FieldDescriptor {
                path: base.child(item_field.key.clone()),
                label: item_field.label.clone(),
                kind: item_field.kind,
                required: item_field.required,
            };
            let value = match extras.get(&item_field.key).map(FieldValue::classify) {
                Some(FieldValue::Scalar(v)) => {
                    let v = v.clone();
                    extras.shift_remove(&item_field.key);
                    v
                }
                _ => item_field.kind.empty_value(),
            };
            fields.push(BoundField::new(descriptor, value));
        }

        Self::Complex { index, fields, extras }
    }

    /// Position in the list
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Simple { index, .. } | Self::Complex { index, .. } => *index,
        }
    }

    /// Bound fields of this item
    #[must_use]
    pub fn fields(&self) -> &[BoundField] {
        match self {
            Self::Simple { field, .. } => std::slice::from_ref(field),
            Self::Complex { fields, .. } => fields,
        }
    }

    /// Mutable bound fields of this item
    pub fn fields_mut(&mut self) -> &mut [BoundField] {
        match self {
            Self::Simple { field, .. } => std::slice::from_mut(field),
            Self::Complex { fields, .. } => fields,
        }
    }

    /// True if extraction would drop this item
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Simple { field, .. } => field.is_empty(),
            Self::Complex { fields, extras, .. } => extras.is_empty() && fields.iter().all(BoundField::is_empty),
        }
    }

    /// Rebuild the document value, or `None` if blank
    #[must_use]
    pub fn to_value(&self) -> Option<Value> {
        if self.is_blank() {
            return None;
        }
        match self {
            Self::Simple { field, .. } => Some(match field.value() {
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other.clone(),
            }),
            Self::Complex { fields, extras, .. } => {
                let mut map = Map::new();
                for field in fields {
                    map.insert(field.path().last().name().to_string(), field.value().clone());
                }
                for (key, value) in extras {
                    map.insert(key.clone(), value.clone());
                }
                Some(Value::Object(map))
            }
        }
    }

    fn renumber(&mut self, list: &PathExpression, new_index: usize) {
        match self {
            Self::Simple { index, field } => {
                *index = new_index;
                field.relocate(list.item(new_index));
                field.descriptor.label = format!("#{}", new_index + 1);
            }
            Self::Complex { index, fields, .. } => {
                *index = new_index;
                let base = list.item(new_index);
                for field in fields {
                    let key = field.path().last().name().to_string();
                    field.relocate(base.child(key));
                }
            }
        }
    }
}

/// Editable state of one list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListState {
    path: PathExpression,
    label: String,
    shape: ItemShape,
    items: Vec<ItemHandle>,
}

impl ListState {
    /// Bind a list descriptor's items
    #[must_use]
    pub fn new(descriptor: &ListDescriptor) -> Self {
        let mut state = Self {
            path: descriptor.path.clone(),
            label: descriptor.label.clone(),
            shape: descriptor.shape.clone(),
            items: Vec::with_capacity(descriptor.items.len()),
        };
        for (index, value) in descriptor.items.iter().enumerate() {
            let handle = state.handle(index, Some(value));
            state.items.push(handle);
        }
        state
    }

    fn handle(&self, index: usize, value: Option<&Value>) -> ItemHandle {
        match &self.shape {
            ItemShape::Scalar => {
                let value = match value.map(FieldValue::classify) {
                    Some(FieldValue::Scalar(v)) => v.clone(),
                    _ => Value::String(String::new()),
                };
                ItemHandle::simple(&self.path, index, value)
            }
            ItemShape::Fields(shape) => {
                ItemHandle::complex(&self.path, index, shape, value.and_then(Value::as_object))
            }
        }
    }

    /// Location of the array
    #[inline]
    #[must_use]
    pub fn path(&self) -> &PathExpression {
        &self.path
    }

    /// Display label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Item shape
    #[inline]
    #[must_use]
    pub fn shape(&self) -> &ItemShape {
        &self.shape
    }

    /// Items in order
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[ItemHandle] {
        &self.items
    }

    /// Number of items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the list has no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an item, optionally pre-filled, and return its index
    ///
    /// Without defaults every field starts empty (`""`, or `false` for
    /// checkboxes).
    pub fn add_item(&mut self, defaults: Option<&Value>) -> usize {
        let index = self.items.len();
        let handle = self.handle(index, defaults);
        self.items.push(handle);
        index
    }

    /// Remove the item at `index` and renumber the ones after it
    ///
    /// # Errors
    /// Returns [`ListError::IndexOutOfRange`] if `index >= len`
    pub fn remove_item(&mut self, index: usize) -> Result<ItemHandle, ListError> {
        if index >= self.items.len() {
            return Err(ListError::IndexOutOfRange {
                list: self.path.clone(),
                index,
                len: self.items.len(),
            });
        }
        let removed = self.items.remove(index);
        self.reindex();
        Ok(removed)
    }

    /// Renumber all items to `0..len`
    pub fn reindex(&mut self) {
        for (position, item) in self.items.iter_mut().enumerate() {
            item.renumber(&self.path, position);
        }
    }

    /// Remove validation messages from every item
    pub fn clear_issues(&mut self) {
        for item in &mut self.items {
            for field in item.fields_mut() {
                field.set_issue(None);
            }
        }
    }

    /// Rebuild the array from the current items, dropping blank ones
    #[must_use]
    pub fn extract(&self) -> Vec<Value> {
        self.items.iter().filter_map(ItemHandle::to_value).collect()
    }

    /// Bound field at `index` addressed by the path remainder after the item
    ///
    /// # Errors
    /// Returns error if the index is out of range or the key is not a field
    /// of the item
    pub fn field_mut(&mut self, index: usize, rest: &[Segment]) -> Result<&mut BoundField, ListError> {
        let len = self.items.len();
        let list = self.path.clone();
        let item = self.items.get_mut(index).ok_or_else(|| ListError::IndexOutOfRange {
            list: list.clone(),
            index,
            len,
        })?;

        match (item, rest) {
            (ItemHandle::Simple { field, .. }, []) => Ok(field),
            (ItemHandle::Complex { fields, .. }, [segment]) if segment.index().is_none() => fields
                .iter_mut()
                .find(|f| f.path().last().name() == segment.name())
                .ok_or_else(|| ListError::UnknownItemField {
                    list,
                    key: segment.name().to_string(),
                }),
            (_, rest) => Err(ListError::UnknownItemField {
                list,
                key: rest.iter().map(ToString::to_string).collect::<Vec<_>>().join("."),
            }),
        }
    }
}

/// All lists of a form, keyed by path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListController {
    lists: IndexMap<PathExpression, ListState>,
}

impl ListController {
    /// Create empty controller
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a list, replacing any list already at its path
    pub fn register(&mut self, descriptor: &ListDescriptor) {
        self.lists.insert(descriptor.path.clone(), ListState::new(descriptor));
    }

    /// Get list by path
    #[must_use]
    pub fn get(&self, path: &PathExpression) -> Option<&ListState> {
        self.lists.get(path)
    }

    /// Iterate lists in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ListState> {
        self.lists.values()
    }

    /// Iterate lists mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ListState> {
        self.lists.values_mut()
    }

    /// Number of lists
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// True if no lists are registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    fn state_mut(&mut self, path: &PathExpression) -> Result<&mut ListState, ListError> {
        self.lists
            .get_mut(path)
            .ok_or_else(|| ListError::UnknownList(path.clone()))
    }

    /// Append an item to the list at `path`
    ///
    /// # Errors
    /// Returns [`ListError::UnknownList`] if no list is registered at `path`
    pub fn add_item(&mut self, path: &PathExpression, defaults: Option<&Value>) -> Result<usize, ListError> {
        let index = self.state_mut(path)?.add_item(defaults);
        tracing::debug!(list = %path, index, "Added list item");
        Ok(index)
    }

    /// Remove item `index` from the list at `path`
    ///
    /// # Errors
    /// Returns error if the list is unknown or the index out of range
    pub fn remove_item(&mut self, path: &PathExpression, index: usize) -> Result<ItemHandle, ListError> {
        let removed = self.state_mut(path)?.remove_item(index)?;
        tracing::debug!(list = %path, index, "Removed list item");
        Ok(removed)
    }

    /// Rebuild the array at `path`
    ///
    /// # Errors
    /// Returns [`ListError::UnknownList`] if no list is registered at `path`
    pub fn extract(&self, path: &PathExpression) -> Result<Vec<Value>, ListError> {
        self.get(path)
            .map(ListState::extract)
            .ok_or_else(|| ListError::UnknownList(path.clone()))
    }

    /// Find the bound item field addressed by a full path like `jobs[2].company`
    ///
    /// # Errors
    /// Returns error if the path does not address a field of a registered
    /// list
    pub fn field_mut(&mut self, path: &PathExpression) -> Result<&mut BoundField, ListError> {
        let (list, index, rest) = path
            .split_item()
            .ok_or_else(|| ListError::UnknownList(path.clone()))?;
        self.state_mut(&list)?.field_mut(index, rest)
    }

    /// Find a bound item field by full path
    #[must_use]
    pub fn field(&self, path: &PathExpression) -> Option<&BoundField> {
        self.lists
            .values()
            .flat_map(|l| l.items.iter())
            .flat_map(ItemHandle::fields)
            .find(|f| f.path() == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn path(s: &str) -> PathExpression {
        s.parse().unwrap()
    }

    fn scalar_list(items: Value) -> ListState {
        ListState::new(&ListDescriptor {
            path: path("sections.skills.items"),
            label: "Items".into(),
            shape: ItemShape::Scalar,
            items: items.as_array().cloned().unwrap_or_default(),
        })
    }

    fn job_list(items: Value) -> ListState {
        ListState::new(&ListDescriptor {
            path: path("jobs"),
            label: "Jobs".into(),
            shape: ItemShape::Fields(vec![
                ItemField::new("company", FieldKind::Text, true),
                ItemField::new("current", FieldKind::Checkbox, false),
            ]),
            items: items.as_array().cloned().unwrap_or_default(),
        })
    }

    #[test]
    fn remove_then_add_keeps_indices_contiguous() {
        let mut list = scalar_list(json!(["a", "b", "c"]));
        list.remove_item(1).unwrap();
        let added = list.add_item(None);

        assert_eq!(added, 2);
        let paths: Vec<String> = list.items().iter().map(|i| i.fields()[0].path().to_string()).collect();
        assert_eq!(
            paths,
            vec!["sections.skills.items[0]", "sections.skills.items[1]", "sections.skills.items[2]"]
        );
        let values: Vec<&Value> = list.items().iter().map(|i| i.fields()[0].value()).collect();
        assert_eq!(values, vec![&json!("a"), &json!("c"), &json!("")]);
    }

    #[test]
    fn remove_out_of_range() {
        let mut list = scalar_list(json!(["a"]));
        assert_eq!(
            list.remove_item(3),
            Err(ListError::IndexOutOfRange {
                list: path("sections.skills.items"),
                index: 3,
                len: 1
            })
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn extract_trims_and_drops_blank_scalars() {
        let mut list = scalar_list(json!(["  rust ", "", "   ", null]));
        list.add_item(Some(&json!("sql")));
        assert_eq!(list.extract(), vec![json!("rust"), json!("sql")]);
    }

    #[test]
    fn extract_keeps_non_string_scalars() {
        let list = scalar_list(json!([3, true, false]));
        assert_eq!(list.extract(), vec![json!(3), json!(true)]);
    }

    #[test]
    fn complex_items_default_to_empty_values() {
        let mut list = job_list(json!([]));
        list.add_item(None);
        let fields = list.items()[0].fields();
        assert_eq!(fields[0].value(), &json!(""));
        assert_eq!(fields[1].value(), &json!(false));
        assert!(list.extract().is_empty());
    }

    #[test]
    fn complex_items_keep_extras() {
        let list = job_list(json!([{"company": "Acme", "tags": ["x"], "note": 1}]));
        assert_eq!(
            list.extract(),
            vec![json!({"company": "Acme", "current": false, "tags": ["x"], "note": 1})]
        );
    }

    #[test]
    fn field_mut_by_path() {
        let mut controller = ListController::new();
        controller.register(&ListDescriptor {
            path: path("jobs"),
            label: "Jobs".into(),
            shape: ItemShape::Fields(vec![ItemField::new("company", FieldKind::Text, true)]),
            items: vec![json!({"company": "A"}), json!({"company": "B"})],
        });

        controller
            .field_mut(&path("jobs[1].company"))
            .unwrap()
            .set_value(json!("Globex"));
        assert_eq!(controller.extract(&path("jobs")).unwrap()[1], json!({"company": "Globex"}));

        assert!(matches!(
            controller.field_mut(&path("jobs[1].title")),
            Err(ListError::UnknownItemField { .. })
        ));
        assert!(matches!(
            controller.field_mut(&path("jobs[7].company")),
            Err(ListError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            controller.add_item(&path("missing"), None),
            Err(ListError::UnknownList(_))
        ));
    }

    #[test]
    fn empty_value_rules() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("  ")));
        assert!(is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(true)));
        assert!(!is_empty_value(&json!("x")));
    }
}
