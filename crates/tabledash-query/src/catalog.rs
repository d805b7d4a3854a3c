// SPDX-License-Identifier: Apache-2.0

use crate::query_error::{QueryError, QueryErrorCode};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tabledash_model::TableRegistry;

const IDENTIFIER_MAX_LEN: usize = 128;

fn identifier_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
}

/// Plain SQL identifier: letter or underscore, then letters, digits, underscores.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    name.len() <= IDENTIFIER_MAX_LEN && identifier_re().is_some_and(|re| re.is_match(name))
}

fn checked(kind: &str, name: &str) -> Result<String, QueryError> {
    if is_valid_identifier(name) {
        Ok(name.to_string())
    } else {
        Err(QueryError::new(
            QueryErrorCode::Validation,
            format!("invalid {kind} identifier: {name:?}"),
        ))
    }
}

/// Allow-listed shape of one writable table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    table: String,
    identity_column: String,
    columns: Vec<String>,
}

impl TableSchema {
    pub fn new(table: &str, identity_column: &str, columns: &[&str]) -> Result<Self, QueryError> {
        let table = checked("table", table)?;
        let identity_column = checked("column", identity_column)?;
        let columns = columns
            .iter()
            .map(|c| checked("column", c))
            .collect::<Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            return Err(QueryError::new(
                QueryErrorCode::Validation,
                format!("table {table} declares no columns"),
            ));
        }
        if !columns.contains(&identity_column) {
            return Err(QueryError::new(
                QueryErrorCode::Validation,
                format!("identity column {identity_column} is not a column of {table}"),
            ));
        }
        Ok(Self {
            table,
            identity_column,
            columns,
        })
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn identity_column(&self) -> &str {
        &self.identity_column
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Fixed, process-wide allow-list of table and column identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryCatalog {
    dataset: Option<String>,
    tables: BTreeMap<String, TableSchema>,
}

impl QueryCatalog {
    pub fn new(dataset: Option<&str>, schemas: Vec<TableSchema>) -> Result<Self, QueryError> {
        let dataset = dataset.map(|d| checked("dataset", d)).transpose()?;
        let mut tables = BTreeMap::new();
        for schema in schemas {
            if tables.contains_key(schema.table()) {
                return Err(QueryError::new(
                    QueryErrorCode::Validation,
                    format!("duplicate table schema: {}", schema.table()),
                ));
            }
            tables.insert(schema.table().to_string(), schema);
        }
        Ok(Self { dataset, tables })
    }

    /// Allow-list every registry table that declares its columns.
    ///
    /// Tables relying on schema inference have no column list to validate
    /// against, so they are not reachable through the translator.
    pub fn from_registry(registry: &TableRegistry, dataset: Option<&str>) -> Result<Self, QueryError> {
        let mut schemas = Vec::new();
        for (name, config) in registry.iter() {
            if !config.declares_fields() {
                tracing::warn!(table = name, "table declares no fields; not allow-listed");
                continue;
            }
            let columns: Vec<&str> = config.fields.iter().map(|f| f.name.as_str()).collect();
            schemas.push(TableSchema::new(name, config.id_field(), &columns)?);
        }
        Self::new(dataset, schemas)
    }

    pub fn schema(&self, table: &str) -> Result<&TableSchema, QueryError> {
        self.tables
            .get(table)
            .ok_or_else(|| QueryError::unknown_table(table))
    }

    #[must_use]
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Quoted table reference, dataset-qualified when a dataset is configured.
    #[must_use]
    pub(crate) fn table_ref(&self, schema: &TableSchema) -> String {
        match &self.dataset {
            Some(dataset) => format!("`{dataset}.{}`", schema.table()),
            None => format!("`{}`", schema.table()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_grammar_rejects_query_syntax() {
        assert!(is_valid_identifier("bundle_name"));
        assert!(is_valid_identifier("_x1"));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("a b"));
        assert!(!is_valid_identifier("x`; DROP TABLE y; --"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier(&"a".repeat(IDENTIFIER_MAX_LEN + 1)));
    }

    #[test]
    fn catalog_from_builtin_registry_allow_lists_both_tables() {
        let catalog =
            QueryCatalog::from_registry(&TableRegistry::builtin(), Some("infra_audit")).expect("catalog");
        assert_eq!(
            catalog.table_names().collect::<Vec<_>>(),
            vec!["critical_dags", "persons"]
        );
        let persons = catalog.schema("persons").expect("persons");
        assert_eq!(persons.identity_column(), "name");
        assert_eq!(catalog.table_ref(persons), "`infra_audit.persons`");
    }

    #[test]
    fn schema_rejects_identity_outside_columns() {
        let err = TableSchema::new("t", "missing", &["a"]).expect_err("bad identity");
        assert_eq!(err.code, QueryErrorCode::Validation);
    }

    #[test]
    fn schema_rejects_hostile_column_names() {
        assert!(TableSchema::new("t", "a", &["a", "b; --"]).is_err());
    }
}
