//! Introspection configuration
//!
//! Everything the introspector knows about résumé conventions lives here:
//! which top-level key holds the sections, which keys carry section titles,
//! which keys are required, and what shape an empty list should take.
//! The defaults cover English, Portuguese and Spanish documents; a TOML or
//! YAML file can replace any part of them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::{ItemField, ItemShape};
use crate::error::ConfigError;
use crate::kind::{normalize_name, FieldKind};

/// Named item shape with the section or list names it applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasGroup {
    /// Group name, used in logs only
    pub name: String,
    /// Section or list names, compared after [`normalize_name`]
    pub aliases: Vec<String>,
    /// Shape given to empty lists matched by this group
    pub shape: ItemShape,
}

impl AliasGroup {
    /// Create group
    #[must_use]
    pub fn new(name: impl Into<String>, aliases: &[&str], shape: ItemShape) -> Self {
        Self {
            name: name.into(),
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
            shape,
        }
    }

    /// True if `name` is one of this group's aliases
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let name = normalize_name(name);
        self.aliases.iter().any(|alias| normalize_name(alias) == name)
    }
}

/// Configuration for [`StructureIntrospector`](crate::StructureIntrospector)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrospectionConfig {
    /// Top-level keys that may hold the section map; first present wins
    pub section_keys: Vec<String>,
    /// Keys inside a section body that carry its display title
    pub title_keys: Vec<String>,
    /// Top-level keys marked as required
    pub required_keys: Vec<String>,
    /// Keys inside list items marked as required
    pub item_required_keys: Vec<String>,
    /// Title of the section holding top-level fields
    pub personal_title: String,
    /// Item shapes for empty lists, tried in order
    pub alias_groups: Vec<AliasGroup>,
    /// Shape used when no alias group matches
    pub fallback_shape: Vec<ItemField>,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            section_keys: strings(&["sections", "secoes", "secciones"]),
            title_keys: strings(&["title", "titulo"]),
            required_keys: strings(&["name", "nome", "nombre", "email", "languageName"]),
            item_required_keys: strings(&[
                "name", "nome", "nombre", "company", "empresa", "position", "cargo", "title",
            ]),
            personal_title: "Personal Information".to_string(),
            alias_groups: default_alias_groups(),
            fallback_shape: vec![
                ItemField::new("name", FieldKind::Text, true),
                ItemField::new("description", FieldKind::Textarea, false),
            ],
        }
    }
}

impl IntrospectionConfig {
    /// Load configuration from a TOML or YAML file, picked by extension
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&text),
            _ => Self::from_toml(&text),
        }
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error on malformed TOML
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    /// Returns error on malformed YAML
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Set section keys
    #[inline]
    #[must_use]
    pub fn with_section_keys(mut self, keys: &[&str]) -> Self {
        self.section_keys = strings(keys);
        self
    }

    /// Set required top-level keys
    #[inline]
    #[must_use]
    pub fn with_required_keys(mut self, keys: &[&str]) -> Self {
        self.required_keys = strings(keys);
        self
    }

    /// Append an alias group; earlier groups take precedence
    #[inline]
    #[must_use]
    pub fn with_alias_group(mut self, group: AliasGroup) -> Self {
        self.alias_groups.push(group);
        self
    }

    /// Is `key` a reserved section key
    #[must_use]
    pub fn is_section_key(&self, key: &str) -> bool {
        self.section_keys.iter().any(|k| k == key)
    }

    /// Is `key` a section title key
    #[must_use]
    pub fn is_title_key(&self, key: &str) -> bool {
        self.title_keys.iter().any(|k| k == key)
    }

    /// Is the top-level `key` required
    #[must_use]
    pub fn is_required(&self, key: &str) -> bool {
        self.required_keys.iter().any(|k| k == key)
    }

    /// Is the item-level `key` required
    #[must_use]
    pub fn is_item_required(&self, key: &str) -> bool {
        self.item_required_keys.iter().any(|k| k == key)
    }

    /// Shape for an empty list
    ///
    /// The list's own name is tried against every group first, then the
    /// name of the enclosing section. Within each pass the first matching
    /// group wins; with no match the fallback shape is used.
    #[must_use]
    pub fn shape_for_empty(&self, list_name: &str, section_name: Option<&str>) -> ItemShape {
        let by_list = self.alias_groups.iter().find(|g| g.matches(list_name));
        let by_section = || {
            section_name.and_then(|name| self.alias_groups.iter().find(|g| g.matches(name)))
        };

        match by_list.or_else(by_section) {
            Some(group) => {
                tracing::debug!(list = list_name, group = %group.name, "Empty list shape from alias group");
                group.shape.clone().labelled()
            }
            None => {
                tracing::debug!(list = list_name, "Empty list shape from fallback");
                ItemShape::Fields(self.fallback_shape.clone()).labelled()
            }
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_alias_groups() -> Vec<AliasGroup> {
    use FieldKind::{Date, Text, Textarea, Url};

    vec![
        AliasGroup::new(
            "simple",
            &[
                "languages", "idiomas", "certifications", "certificacoes", "certificaciones",
                "courses", "cursos", "publications", "publicacoes", "publicaciones",
                "references", "referencias", "list", "lista", "items", "interests",
                "interesses", "intereses",
            ],
            ItemShape::Scalar,
        ),
        AliasGroup::new(
            "experience",
            &[
                "experience", "experiences", "workexperience", "experiencia",
                "experienciaprofissional", "experienciaprofesional", "jobs", "empregos",
                "empleos", "employment", "work",
            ],
            ItemShape::Fields(vec![
                ItemField::new("company", Text, true),
                ItemField::new("title", Text, true),
                ItemField::new("period", Date, false),
                ItemField::new("description", Textarea, false),
            ]),
        ),
        AliasGroup::new(
            "education",
            &["education", "educacao", "educacion", "formacao", "formacion", "studies"],
            ItemShape::Fields(vec![
                ItemField::new("course", Text, true),
                ItemField::new("institution", Text, true),
                ItemField::new("period", Date, false),
                ItemField::new("description", Textarea, false),
            ]),
        ),
        AliasGroup::new(
            "projects",
            &["projects", "projetos", "proyectos", "portfolio"],
            ItemShape::Fields(vec![
                ItemField::new("name", Text, true),
                ItemField::new("description", Textarea, false),
                ItemField::new("technologies", Text, false),
                ItemField::new("link", Url, false),
            ]),
        ),
        AliasGroup::new(
            "skills",
            &["skills", "habilidades", "competencias", "categories", "categorias"],
            ItemShape::Fields(vec![
                ItemField::new("name", Text, true),
                ItemField::new("skills", Textarea, false),
            ]),
        ),
    ]
}
