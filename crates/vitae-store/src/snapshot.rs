//! Locale-bound document snapshots and their fingerprints

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::locale::Locale;

/// A document as stored for one locale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Locale the document belongs to
    pub locale: Locale,
    /// Document content
    pub document: Value,
}

impl Snapshot {
    /// Create snapshot
    #[inline]
    #[must_use]
    pub fn new(locale: Locale, document: Value) -> Self {
        Self { locale, document }
    }

    /// Hex SHA-256 of the document's canonical form
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.document)
    }
}

/// Hex SHA-256 of a document's canonical form
///
/// Key order does not affect the result, and integral floats hash like the
/// equal integer.
#[must_use]
pub fn fingerprint(document: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(document).as_bytes());
    hex::encode(hasher.finalize())
}

/// Compact JSON with object keys sorted
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Number(n) => match n.as_f64() {
            #[allow(clippy::cast_possible_truncation)]
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
                out.push_str(&(f as i64).to_string());
            }
            _ => out.push_str(&n.to_string()),
        },
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_sorts_keys_and_escapes() {
        let doc = json!({"b": 1, "a": {"z": [true, null], "y": "q\"uote"}});
        assert_eq!(
            canonical_json(&doc),
            r#"{"a":{"y":"q\"uote","z":[true,null]},"b":1}"#
        );
    }

    #[test]
    fn fingerprint_ignores_key_order_and_number_form() {
        let a = json!({"name": "Ana", "years": 3, "tags": ["x"]});
        let b = json!({"tags": ["x"], "years": 3.0, "name": "Ana"});
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 64);
    }

    #[test]
    fn fingerprint_detects_changes() {
        assert_ne!(fingerprint(&json!({"a": 1})), fingerprint(&json!({"a": 2})));
        assert_ne!(fingerprint(&json!(["a", "b"])), fingerprint(&json!(["b", "a"])));
    }
}
