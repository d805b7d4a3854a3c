// SPDX-License-Identifier: Apache-2.0

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Identity column assumed for tables that declare no configuration.
pub const DEFAULT_ID_FIELD: &str = "bundle_name";

pub const BUILTIN_PERSONS: &str = "persons";
pub const BUILTIN_CRITICAL_DAGS: &str = "critical_dags";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    pub label: String,
}

impl FieldSpec {
    #[must_use]
    pub fn new(name: &str, field_type: FieldType, label: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct TableConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl TableConfig {
    #[must_use]
    pub fn new(id_field: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            id_field: Some(id_field.to_string()),
            fields,
        }
    }

    /// Identity column, falling back to [`DEFAULT_ID_FIELD`].
    #[must_use]
    pub fn id_field(&self) -> &str {
        self.id_field.as_deref().unwrap_or(DEFAULT_ID_FIELD)
    }

    /// `false` means the column set must be inferred from data.
    #[must_use]
    pub fn declares_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ValidationError("field name must not be empty".to_string()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ValidationError(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
        }
        if let Some(id) = &self.id_field {
            if self.declares_fields() && self.field(id).is_none() {
                return Err(ValidationError(format!(
                    "idField `{id}` does not name a declared field"
                )));
            }
        }
        Ok(())
    }
}

/// Immutable table name → configuration mapping.
///
/// Unknown names are not an error: [`TableRegistry::lookup`] hands back the
/// fallback configuration, which tells renderers to infer columns from data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRegistry {
    tables: BTreeMap<String, TableConfig>,
    fallback: TableConfig,
}

impl TableRegistry {
    pub fn new(tables: BTreeMap<String, TableConfig>) -> Result<Self, ValidationError> {
        for (name, config) in &tables {
            if name.trim().is_empty() {
                return Err(ValidationError("table name must not be empty".to_string()));
            }
            config
                .validate()
                .map_err(|e| ValidationError(format!("table `{name}`: {e}")))?;
        }
        Ok(Self {
            tables,
            fallback: TableConfig::default(),
        })
    }

    /// The two tables the dashboard ships with.
    #[must_use]
    pub fn builtin() -> Self {
        let mut tables = BTreeMap::new();
        tables.insert(
            BUILTIN_PERSONS.to_string(),
            TableConfig::new(
                "name",
                vec![
                    FieldSpec::new("name", FieldType::String, "Name"),
                    FieldSpec::new("age", FieldType::Number, "Age"),
                    FieldSpec::new("location", FieldType::String, "Location"),
                ],
            ),
        );
        tables.insert(
            BUILTIN_CRITICAL_DAGS.to_string(),
            TableConfig::new(
                "bundle_name",
                vec![FieldSpec::new("bundle_name", FieldType::String, "Bundle Name")],
            ),
        );
        Self {
            tables,
            fallback: TableConfig::default(),
        }
    }

    pub fn from_json_str(input: &str) -> Result<Self, ValidationError> {
        let tables: BTreeMap<String, TableConfig> = serde_json::from_str(input)
            .map_err(|e| ValidationError(format!("table config parse failed: {e}")))?;
        Self::new(tables)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, ValidationError> {
        let tables: BTreeMap<String, TableConfig> = serde_yaml::from_str(input)
            .map_err(|e| ValidationError(format!("table config parse failed: {e}")))?;
        Self::new(tables)
    }

    /// Loads a registry file; `.yaml`/`.yml` are parsed as YAML, anything else as JSON.
    pub fn from_path(path: &Path) -> Result<Self, ValidationError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ValidationError(format!("table config read failed {}: {e}", path.display()))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            _ => Self::from_json_str(&text),
        }
    }

    #[must_use]
    pub fn lookup(&self, table: &str) -> &TableConfig {
        self.tables.get(table).unwrap_or(&self.fallback)
    }

    #[must_use]
    pub fn is_registered(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableConfig)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_table_falls_back_to_bundle_name_without_fields() {
        let registry = TableRegistry::builtin();
        let config = registry.lookup("does_not_exist");
        assert_eq!(config.id_field(), DEFAULT_ID_FIELD);
        assert!(!config.declares_fields());
        assert!(!registry.is_registered("does_not_exist"));
    }

    #[test]
    fn builtin_persons_is_keyed_by_name() {
        let registry = TableRegistry::builtin();
        let persons = registry.lookup(BUILTIN_PERSONS);
        assert_eq!(persons.id_field(), "name");
        assert_eq!(
            persons.field("age").map(|f| f.field_type),
            Some(FieldType::Number)
        );
        assert_eq!(
            registry.table_names().collect::<Vec<_>>(),
            vec!["critical_dags", "persons"]
        );
    }

    #[test]
    fn validate_rejects_id_field_outside_declared_fields() {
        let config = TableConfig::new("missing", vec![FieldSpec::new("a", FieldType::String, "A")]);
        let err = config.validate().expect_err("id outside fields");
        assert!(err.0.contains("missing"));
    }

    #[test]
    fn validate_rejects_duplicate_field_names() {
        let config = TableConfig::new(
            "a",
            vec![
                FieldSpec::new("a", FieldType::String, "A"),
                FieldSpec::new("a", FieldType::Number, "A again"),
            ],
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn id_field_without_declared_fields_is_accepted() {
        let config = TableConfig {
            id_field: Some("job".to_string()),
            fields: Vec::new(),
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.id_field(), "job");
    }
}
