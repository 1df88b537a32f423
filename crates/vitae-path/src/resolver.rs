//! Get/set of values inside a JSON document by [`PathExpression`]
//!
//! `set` auto-vivifies: missing objects and arrays along the path are created,
//! and values of the wrong container kind are replaced, so assignment never
//! fails for a well-formed path.

use serde_json::{Map, Value};

use crate::path::{PathError, PathExpression, Segment, MAX_INDEX};

/// Result of a lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    /// A value exists at the path (it may be JSON `null`)
    Found(&'a Value),
    /// Some segment of the path is missing
    Absent,
}

impl<'a> Resolved<'a> {
    /// Convert to an `Option`
    #[inline]
    #[must_use]
    pub fn found(self) -> Option<&'a Value> {
        match self {
            Self::Found(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// True if nothing lives at the path
    #[inline]
    #[must_use]
    pub fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Look up the value at `path`
#[must_use]
pub fn get<'a>(doc: &'a Value, path: &PathExpression) -> Resolved<'a> {
    let mut current = doc;
    for segment in path.iter() {
        let Some(next) = current.as_object().and_then(|map| map.get(segment.name())) else {
            return Resolved::Absent;
        };
        current = match segment.index() {
            Some(index) => match next.as_array().and_then(|items| items.get(index)) {
                Some(item) => item,
                None => return Resolved::Absent,
            },
            None => next,
        };
    }
    Resolved::Found(current)
}

/// Assign `value` at `path`, creating intermediate containers as needed
///
/// Paths built by hand with an index above [`MAX_INDEX`] leave `doc`
/// unchanged; parsed paths never carry one.
pub fn set(doc: &mut Value, path: &PathExpression, value: Value) {
    let segments = path.segments();
    if segments.iter().any(|s| s.index().is_some_and(|i| i > MAX_INDEX)) {
        return;
    }
    let (last, intermediate) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut current = doc;
    for segment in intermediate {
        current = descend(current, segment);
    }
    *slot(current, last) = value;
}

/// Parse `path` and look up the value at it
///
/// # Errors
/// Returns [`PathError`] if `path` is not a valid path expression
pub fn get_str<'a>(doc: &'a Value, path: &str) -> Result<Resolved<'a>, PathError> {
    let path: PathExpression = path.parse()?;
    Ok(get(doc, &path))
}

/// Parse `path` and assign `value` at it
///
/// # Errors
/// Returns [`PathError`] if `path` is not a valid path expression
pub fn set_str(doc: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    let path: PathExpression = path.parse()?;
    set(doc, &path, value);
    Ok(())
}

/// Step into an intermediate segment, yielding the object the next segment
/// will be resolved against
fn descend<'a>(current: &'a mut Value, segment: &Segment) -> &'a mut Value {
    let target = slot(current, segment);
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    target
}

/// Locate (creating if needed) the value addressed by a single segment
fn slot<'a>(current: &'a mut Value, segment: &Segment) -> &'a mut Value {
    let map = ensure_object(current);
    let entry = map
        .entry(segment.name().to_string())
        .or_insert(Value::Null);

    let Some(index) = segment.index() else {
        return entry;
    };

    if !entry.is_array() {
        *entry = Value::Array(Vec::new());
    }
    let Value::Array(items) = entry else {
        unreachable!("entry was just made an array");
    };
    if items.len() <= index {
        items.resize(index + 1, Value::Null);
    }
    &mut items[index]
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just made an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn p(s: &str) -> PathExpression {
        s.parse().unwrap()
    }

    #[test]
    fn get_existing_values() {
        let doc = json!({
            "name": "Ana",
            "sections": {
                "experience": {
                    "jobs": [{"company": "Acme"}, {"company": "Globex"}]
                }
            },
            "skills": ["rust", "sql"]
        });

        assert_eq!(get(&doc, &p("name")), Resolved::Found(&json!("Ana")));
        assert_eq!(
            get(&doc, &p("sections.experience.jobs[1].company")).found(),
            Some(&json!("Globex"))
        );
        assert_eq!(get(&doc, &p("skills[0]")).found(), Some(&json!("rust")));
    }

    #[test]
    fn get_reports_absent() {
        let doc = json!({"a": {"b": 1}, "list": [1]});
        assert!(get(&doc, &p("missing")).is_absent());
        assert!(get(&doc, &p("a.c")).is_absent());
        assert!(get(&doc, &p("a.b.c")).is_absent());
        assert!(get(&doc, &p("list[5]")).is_absent());
        assert!(get(&doc, &p("a[0]")).is_absent());
    }

    #[test]
    fn get_distinguishes_null_from_absent() {
        let doc = json!({"a": null});
        assert_eq!(get(&doc, &p("a")), Resolved::Found(&Value::Null));
    }

    #[test]
    fn set_creates_objects() {
        let mut doc = json!({});
        set(&mut doc, &p("sections.about.text"), json!("hello"));
        assert_eq!(doc, json!({"sections": {"about": {"text": "hello"}}}));
    }

    #[test]
    fn set_creates_arrays_for_indexed_segments() {
        let mut doc = json!({});
        set(&mut doc, &p("jobs[1].company"), json!("Acme"));
        assert_eq!(doc, json!({"jobs": [null, {"company": "Acme"}]}));

        set(&mut doc, &p("skills[0]"), json!("rust"));
        assert_eq!(doc["skills"], json!(["rust"]));
    }

    #[test]
    fn set_overwrites_existing_values() {
        let mut doc = json!({"jobs": [{"company": "Old", "title": "Dev"}]});
        set(&mut doc, &p("jobs[0].company"), json!("New"));
        assert_eq!(doc, json!({"jobs": [{"company": "New", "title": "Dev"}]}));
    }

    #[test]
    fn set_replaces_wrong_container_kinds() {
        let mut doc = json!({"a": "scalar", "list": {"not": "array"}});
        set(&mut doc, &p("a.b"), json!(1));
        set(&mut doc, &p("list[0]"), json!("x"));
        assert_eq!(doc, json!({"a": {"b": 1}, "list": ["x"]}));

        let mut scalar_root = json!(42);
        set(&mut scalar_root, &p("x"), json!(true));
        assert_eq!(scalar_root, json!({"x": true}));
    }

    #[test]
    fn set_whole_list() {
        let mut doc = json!({"sections": {"skills": {"items": ["a"]}}});
        set(&mut doc, &p("sections.skills.items"), json!(["a", "b"]));
        assert_eq!(doc["sections"]["skills"]["items"], json!(["a", "b"]));
    }

    #[test]
    fn string_helpers_validate_paths() {
        let mut doc = json!({});
        set_str(&mut doc, "a.b[0]", json!(1)).unwrap();
        assert_eq!(get_str(&doc, "a.b[0]").unwrap().found(), Some(&json!(1)));

        assert!(matches!(
            set_str(&mut doc, "a[b]", json!(1)),
            Err(PathError::InvalidIndex(_))
        ));
        assert!(get_str(&doc, "").is_err());
    }

    #[test]
    fn oversized_indices_never_reach_the_document() {
        let mut doc = json!({});
        assert!(matches!(
            set_str(&mut doc, "a[18446744073709551615]", json!(1)),
            Err(PathError::InvalidIndex(_))
        ));
        assert_eq!(doc, json!({}));

        let built = PathExpression::new(vec![Segment::indexed("a", usize::MAX)]).unwrap();
        set(&mut doc, &built, json!(1));
        assert_eq!(doc, json!({}));

        set(&mut doc, &p("a[3]"), json!(1));
        assert_eq!(doc, json!({"a": [null, null, null, 1]}));
    }
}
