//! Session configuration.
//!
//! Both configurations are plain serde values passed into the objects that
//! use them. Nothing here is global.

use crate::error::ConfigError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Behaviour switches of an [`AnnotatedTypeFactory`](crate::factory::AnnotatedTypeFactory).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Type arguments whose inference failed compare as related instead of
    /// being checked.
    pub ignore_uninferred_type_arguments: bool,
    /// Skip type-argument checks when either side of a declared-type
    /// comparison was written raw.
    pub ignore_raw_types: bool,
    /// Require array components to be equal rather than covariant.
    pub invariant_array_components: bool,
    /// Decide kind pairs the equality comparer has no rule for by comparing
    /// effective annotations instead of failing.
    pub raw_type_fallback: bool,
    /// Declaration annotation listing covariant type-argument indices.
    pub covariant_annotation: String,
    /// Alias annotation name to canonical qualifier name.
    pub aliases: IndexMap<String, String>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            ignore_uninferred_type_arguments: true,
            ignore_raw_types: true,
            invariant_array_components: false,
            raw_type_fallback: false,
            covariant_annotation: "Covariant".to_owned(),
            aliases: IndexMap::new(),
        }
    }
}

impl FactoryConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), canonical.into());
        self
    }
}

/// One qualifier of a hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifierDecl {
    pub name: String,
    /// Direct supertypes.
    #[serde(default)]
    pub subtype_of: Vec<String>,
    #[serde(default)]
    pub polymorphic: bool,
    /// Top of the sub-hierarchy a polymorphic qualifier belongs to. May be
    /// omitted when there is a single sub-hierarchy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
}

impl QualifierDecl {
    pub fn new(name: impl Into<String>, subtype_of: &[&str]) -> Self {
        Self {
            name: name.into(),
            subtype_of: subtype_of.iter().map(|s| (*s).to_owned()).collect(),
            polymorphic: false,
            top: None,
        }
    }

    pub fn polymorphic(name: impl Into<String>, top: Option<&str>) -> Self {
        Self {
            name: name.into(),
            subtype_of: Vec::new(),
            polymorphic: true,
            top: top.map(str::to_owned),
        }
    }
}

/// Declarative form of a qualifier hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    pub qualifiers: Vec<QualifierDecl>,
}

impl HierarchyConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_config_defaults_apply_to_missing_fields() {
        let config = FactoryConfig::from_json(r#"{ "invariant_array_components": true }"#)
            .expect("valid json");
        assert!(config.invariant_array_components);
        assert!(config.ignore_uninferred_type_arguments);
        assert!(config.ignore_raw_types);
        assert!(!config.raw_type_fallback);
        assert_eq!(config.covariant_annotation, "Covariant");
    }

    #[test]
    fn aliases_keep_declaration_order() {
        let config = FactoryConfig::from_json(
            r#"{ "aliases": { "CheckForNull": "Nullable", "NotNull": "NonNull" } }"#,
        )
        .expect("valid json");
        let keys: Vec<&str> = config.aliases.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["CheckForNull", "NotNull"]);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = HierarchyConfig::from_json("{ \"qualifiers\": 3 }");
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }
}
