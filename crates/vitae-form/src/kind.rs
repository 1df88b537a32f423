//! Field kinds and label formatting
//!
//! Kinds are guessed from the key name (and the value for booleans). The
//! substring lists cover the English, Portuguese and Spanish keys found in
//! résumé documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a leaf value is rendered and edited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line text
    #[default]
    Text,
    /// E-mail address
    Email,
    /// Phone number
    Tel,
    /// Link
    Url,
    /// Date or period
    Date,
    /// Boolean toggle
    Checkbox,
    /// Multi-line text
    Textarea,
}

const EMAIL_HINTS: &[&str] = &["email"];
const TEL_HINTS: &[&str] = &["phone", "tel", "celular"];
const URL_HINTS: &[&str] = &["url", "website", "linkedin"];
const DATE_HINTS: &[&str] = &["data", "date"];
const TEXTAREA_HINTS: &[&str] = &[
    "description",
    "descricao",
    "descripcion",
    "text",
    "texto",
    "activities",
    "atividades",
    "content",
    "summary",
    "resumo",
];

impl FieldKind {
    /// Infer the kind of a field from its key and current value
    ///
    /// Booleans are always checkboxes; otherwise the lower-cased key is
    /// matched against the hint lists in a fixed order.
    #[must_use]
    pub fn infer(key: &str, value: Option<&Value>) -> Self {
        if matches!(value, Some(Value::Bool(_))) {
            return Self::Checkbox;
        }

        let key = key.to_lowercase();
        let has = |hints: &[&str]| hints.iter().any(|hint| key.contains(hint));

        if has(EMAIL_HINTS) {
            Self::Email
        } else if has(TEL_HINTS) {
            Self::Tel
        } else if has(URL_HINTS) {
            Self::Url
        } else if has(DATE_HINTS) {
            Self::Date
        } else if has(TEXTAREA_HINTS) {
            Self::Textarea
        } else {
            Self::Text
        }
    }

    /// Value of a freshly added, untouched field of this kind
    #[inline]
    #[must_use]
    pub fn empty_value(self) -> Value {
        match self {
            Self::Checkbox => Value::Bool(false),
            _ => Value::String(String::new()),
        }
    }

    /// Lower-case name, as used in serialized descriptors
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Url => "url",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::Textarea => "textarea",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turn a document key into a display label
///
/// `languageName` → `Language Name`, `linkedin_url` → `Linkedin url`.
#[must_use]
pub fn humanize(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for ch in key.chars() {
        if matches!(ch, '_' | '.' | '-') {
            spaced.push(' ');
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower {
            spaced.push(' ');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        spaced.push(ch);
    }

    let words: Vec<&str> = spaced.split_whitespace().collect();
    let joined = words.join(" ");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-case a name and drop everything but letters and digits
///
/// Used to compare section and list names against alias tables, so that
/// `workExperience`, `work_experience` and `WorkExperience` all match.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infer_from_key_substrings() {
        assert_eq!(FieldKind::infer("email", None), FieldKind::Email);
        assert_eq!(FieldKind::infer("contactEmail", None), FieldKind::Email);
        assert_eq!(FieldKind::infer("telefone", None), FieldKind::Tel);
        assert_eq!(FieldKind::infer("phone", None), FieldKind::Tel);
        assert_eq!(FieldKind::infer("celular", None), FieldKind::Tel);
        assert_eq!(FieldKind::infer("website", None), FieldKind::Url);
        assert_eq!(FieldKind::infer("linkedIn", None), FieldKind::Url);
        assert_eq!(FieldKind::infer("dataNascimento", None), FieldKind::Date);
        assert_eq!(FieldKind::infer("startDate", None), FieldKind::Date);
        assert_eq!(FieldKind::infer("descricao", None), FieldKind::Textarea);
        assert_eq!(FieldKind::infer("name", Some(&json!("Ana"))), FieldKind::Text);
    }

    #[test]
    fn booleans_win_over_key_hints() {
        assert_eq!(FieldKind::infer("emailVerified", Some(&json!(true))), FieldKind::Checkbox);
        assert_eq!(FieldKind::infer("available", Some(&json!(false))), FieldKind::Checkbox);
    }

    #[test]
    fn empty_values() {
        assert_eq!(FieldKind::Checkbox.empty_value(), json!(false));
        assert_eq!(FieldKind::Textarea.empty_value(), json!(""));
    }

    #[test]
    fn humanize_keys() {
        assert_eq!(humanize("languageName"), "Language Name");
        assert_eq!(humanize("name"), "Name");
        assert_eq!(humanize("linkedin_url"), "Linkedin url");
        assert_eq!(humanize("workExperience"), "Work Experience");
        assert_eq!(humanize("URL"), "URL");
        assert_eq!(humanize("experiênciaProfissional"), "Experiência Profissional");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn normalize_names() {
        assert_eq!(normalize_name("workExperience"), "workexperience");
        assert_eq!(normalize_name("work_experience"), "workexperience");
        assert_eq!(normalize_name("Jobs"), "jobs");
    }
}
