//! Local/remote divergence detection
//!
//! Two documents diverge when they are not structurally equal. Object key
//! order never matters and numbers compare by value. Resolution is always a
//! whole-document overwrite in one direction.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use vitae_path::PathExpression;

use crate::locale::Locale;
use crate::snapshot::{fingerprint, Snapshot};

/// Reconciliation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Most divergent paths reported in an advisory
    pub max_paths: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self { max_paths: 16 }
    }
}

impl ReconcileConfig {
    /// Set path limit
    #[inline]
    #[must_use]
    pub fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }
}

/// How the user settles a divergence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Overwrite the remote copy with the local one
    PushLocal,
    /// Discard the local copy and reload the remote one
    PullRemote,
}

/// Advisory raised when local and remote copies differ
///
/// Never returned as an error: editing and saving continue while it stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationConflict {
    /// Locale being synced
    pub locale: Locale,
    /// Fingerprint of the local snapshot
    pub local_fingerprint: String,
    /// Fingerprint of the remote document
    pub remote_fingerprint: String,
    /// Some of the locations that differ
    pub paths: Vec<PathExpression>,
    /// True if more paths differ than are listed
    pub truncated: bool,
}

impl Display for ReconciliationConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "local and remote copies of '{}' differ ({} vs {})",
            self.locale,
            short(&self.local_fingerprint),
            short(&self.remote_fingerprint)
        )?;
        if !self.paths.is_empty() {
            let paths: Vec<String> = self.paths.iter().map(ToString::to_string).collect();
            write!(f, " at {}", paths.join(", "))?;
            if self.truncated {
                f.write_str(", ...")?;
            }
        }
        Ok(())
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..8).unwrap_or(fingerprint)
}

/// Outcome of comparing a local snapshot with the remote copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing cached locally; the remote copy can be taken as-is
    NoLocal,
    /// Remote has no copy; the local one should be pushed
    RemoteMissing,
    /// Both copies are equal
    InSync,
    /// Copies differ
    Diverged(ReconciliationConflict),
}

/// Compares local and remote documents
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    config: ReconcileConfig,
}

impl ReconciliationEngine {
    /// Create engine
    #[inline]
    #[must_use]
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// True iff the documents are not structurally equal
    #[inline]
    #[must_use]
    pub fn diff(&self, local: &Value, remote: &Value) -> bool {
        !deep_equal(local, remote)
    }

    /// Compare a locale's local snapshot with its remote copy
    #[must_use]
    pub fn reconcile(&self, local: Option<&Snapshot>, remote: Option<&Value>) -> Reconciliation {
        let (local, remote) = match (local, remote) {
            (None, _) => return Reconciliation::NoLocal,
            (Some(_), None) => return Reconciliation::RemoteMissing,
            (Some(local), Some(remote)) => (local, remote),
        };
        if deep_equal(&local.document, remote) {
            return Reconciliation::InSync;
        }

        let mut paths = Vec::new();
        let complete = divergent_paths(&local.document, remote, None, self.config.max_paths, &mut paths);
        let conflict = ReconciliationConflict {
            locale: local.locale.clone(),
            local_fingerprint: local.fingerprint(),
            remote_fingerprint: fingerprint(remote),
            paths,
            truncated: !complete,
        };
        tracing::warn!(
            locale = %conflict.locale,
            divergent = conflict.paths.len(),
            truncated = conflict.truncated,
            "Local and remote documents diverge"
        );
        Reconciliation::Diverged(conflict)
    }
}

/// Structural equality ignoring object key order
#[must_use]
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| deep_equal(value, other)))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        _ => a == b,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        #[allow(clippy::float_cmp)]
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Collect up to `limit` paths where the documents differ
///
/// Returns false if the limit cut the walk short. Differences that cannot be
/// addressed by a path (the root itself, arrays nested directly in arrays)
/// are reported at the nearest addressable ancestor.
fn divergent_paths(
    a: &Value,
    b: &Value,
    at: Option<&PathExpression>,
    limit: usize,
    out: &mut Vec<PathExpression>,
) -> bool {
    let report = |path: PathExpression, out: &mut Vec<PathExpression>| {
        if out.len() >= limit {
            return false;
        }
        out.push(path);
        true
    };

    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            let keys = left.keys().chain(right.keys().filter(|k| !left.contains_key(*k)));
            for key in keys {
                let child = match at {
                    Some(parent) => parent.child(key.clone()),
                    None => PathExpression::single(key.clone()),
                };
                let complete = match (left.get(key), right.get(key)) {
                    (Some(x), Some(y)) => divergent_paths(x, y, Some(&child), limit, out),
                    _ => report(child, out),
                };
                if !complete {
                    return false;
                }
            }
            true
        }
        (Value::Array(left), Value::Array(right)) if at.is_some_and(|p| p.last().index().is_none()) => {
            let Some(list) = at else {
                return true;
            };
            for index in 0..left.len().max(right.len()) {
                let child = list.item(index);
                let complete = match (left.get(index), right.get(index)) {
                    (Some(x), Some(y)) => divergent_paths(x, y, Some(&child), limit, out),
                    _ => report(child, out),
                };
                if !complete {
                    return false;
                }
            }
            true
        }
        _ if deep_equal(a, b) => true,
        _ => match at {
            Some(path) => report(path.clone(), out),
            None => true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn snapshot(doc: Value) -> Snapshot {
        Snapshot::new(Locale::new("pt").unwrap(), doc)
    }

    fn paths(conflict: &ReconciliationConflict) -> Vec<String> {
        conflict.paths.iter().map(ToString::to_string).collect()
    }

    fn document() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            (-1.0e6f64..1.0e6).prop_map(Value::from),
            "[a-zA-Z ]{0,8}".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    fn reversed_keys(value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .rev()
                    .map(|(key, value)| (key.clone(), reversed_keys(value)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(reversed_keys).collect()),
            other => other.clone(),
        }
    }

    proptest! {
        #[test]
        fn prop_key_order_is_ignored(doc in document()) {
            let reordered = reversed_keys(&doc);
            prop_assert!(deep_equal(&doc, &reordered));
            prop_assert_eq!(fingerprint(&doc), fingerprint(&reordered));

            let engine = ReconciliationEngine::default();
            let outcome = engine.reconcile(Some(&snapshot(doc.clone())), Some(&reordered));
            prop_assert!(matches!(outcome, Reconciliation::InSync), "got {:?}", outcome);
        }

        #[test]
        fn prop_extra_key_is_a_difference(doc in document(), key in "[A-Z]{1,3}") {
            let mut wrapped = json!({"root": doc});
            let changed = {
                let mut copy = wrapped.clone();
                copy[key.as_str()] = json!(true);
                copy
            };
            prop_assert!(!deep_equal(&wrapped, &changed));
            wrapped[key.as_str()] = json!(true);
            prop_assert!(deep_equal(&wrapped, &changed));
        }
    }

    #[test]
    fn key_order_does_not_matter() {
        let engine = ReconciliationEngine::default();
        let a = json!({"name": "Ana", "sections": {"x": {"a": 1, "b": [1, 2]}}});
        let b = json!({"sections": {"x": {"b": [1, 2], "a": 1}}, "name": "Ana"});
        assert!(!engine.diff(&a, &b));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(deep_equal(&json!(1), &json!(1.0)));
        assert!(!deep_equal(&json!(1), &json!(1.5)));
        assert!(!deep_equal(&json!(1), &json!("1")));
        assert!(deep_equal(&json!(u64::MAX), &json!(u64::MAX)));
    }

    #[test]
    fn array_order_matters() {
        assert!(!deep_equal(&json!(["a", "b"]), &json!(["b", "a"])));
    }

    #[test]
    fn reconcile_outcomes() {
        let engine = ReconciliationEngine::default();
        let local = snapshot(json!({"a": 1}));

        assert_eq!(engine.reconcile(None, Some(&json!({}))), Reconciliation::NoLocal);
        assert_eq!(engine.reconcile(Some(&local), None), Reconciliation::RemoteMissing);
        assert_eq!(
            engine.reconcile(Some(&local), Some(&json!({"a": 1.0}))),
            Reconciliation::InSync
        );
        assert!(matches!(
            engine.reconcile(Some(&local), Some(&json!({"a": 2}))),
            Reconciliation::Diverged(_)
        ));
    }

    #[test]
    fn conflict_lists_divergent_paths() {
        let engine = ReconciliationEngine::default();
        let local = snapshot(json!({
            "name": "Ana",
            "sections": {"exp": {"jobs": [{"company": "A"}, {"company": "B"}]}}
        }));
        let remote = json!({
            "name": "Ana Lima",
            "email": "a@b.c",
            "sections": {"exp": {"jobs": [{"company": "A"}]}}
        });

        let Reconciliation::Diverged(conflict) = engine.reconcile(Some(&local), Some(&remote)) else {
            panic!("expected divergence");
        };
        assert_eq!(paths(&conflict), vec!["name", "sections.exp.jobs[1]", "email"]);
        assert!(!conflict.truncated);
        assert_eq!(conflict.local_fingerprint, local.fingerprint());
        assert_ne!(conflict.local_fingerprint, conflict.remote_fingerprint);
        assert!(conflict.to_string().starts_with("local and remote copies of 'pt' differ"));
    }

    #[test]
    fn conflict_paths_are_limited() {
        let engine = ReconciliationEngine::new(ReconcileConfig::default().with_max_paths(2));
        let local = snapshot(json!({"a": 1, "b": 1, "c": 1}));
        let Reconciliation::Diverged(conflict) =
            engine.reconcile(Some(&local), Some(&json!({"a": 2, "b": 2, "c": 2})))
        else {
            panic!("expected divergence");
        };
        assert_eq!(paths(&conflict), vec!["a", "b"]);
        assert!(conflict.truncated);
    }

    #[test]
    fn nested_arrays_report_nearest_path() {
        let engine = ReconciliationEngine::default();
        let local = snapshot(json!({"grid": [[1, 2]]}));
        let Reconciliation::Diverged(conflict) =
            engine.reconcile(Some(&local), Some(&json!({"grid": [[1, 3]]})))
        else {
            panic!("expected divergence");
        };
        assert_eq!(paths(&conflict), vec!["grid[0]"]);
    }

    #[test]
    fn root_type_change_has_no_path() {
        let engine = ReconciliationEngine::default();
        let Reconciliation::Diverged(conflict) =
            engine.reconcile(Some(&snapshot(json!({}))), Some(&json!([])))
        else {
            panic!("expected divergence");
        };
        assert!(conflict.paths.is_empty());
    }
}
