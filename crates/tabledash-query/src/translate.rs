// SPDX-License-Identifier: Apache-2.0

use crate::catalog::{QueryCatalog, TableSchema};
use crate::query_error::{QueryError, QueryErrorCode};
use crate::SELECT_ROW_CAP;
use serde::Serialize;
use serde_json::Value;
use tabledash_model::Row;

/// Parameter carrying the original identity in `WHERE` clauses.
pub const IDENTITY_PARAM: &str = "key";

const VALUE_PARAM_PREFIX: &str = "p_";

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    SelectAll,
    Insert(Row),
    UpdateByIdentity { identity: Value, payload: Row },
    DeleteByIdentity(Value),
}

impl QueryOp {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectAll => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::UpdateByIdentity { .. } => "UPDATE",
            Self::DeleteByIdentity(_) => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParam {
    pub name: String,
    pub value: Value,
}

/// Query text plus named parameters (`@name` placeholders).
///
/// `sql` is assembled only from allow-listed identifiers and fixed keywords.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterizedQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl ParameterizedQuery {
    fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, name: String, value: Value) -> String {
        let placeholder = format!("@{name}");
        self.params.push(QueryParam { name, value });
        placeholder
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }
}

fn scalar(column: &str, value: &Value) -> Result<Value, QueryError> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(QueryError::new(
            QueryErrorCode::Validation,
            format!("value for `{column}` must be a scalar"),
        )),
        other => Ok(other.clone()),
    }
}

fn check_payload_columns(schema: &TableSchema, payload: &Row) -> Result<(), QueryError> {
    for column in payload.columns() {
        if !schema.has_column(column) {
            return Err(QueryError::unknown_column(schema.table(), column));
        }
    }
    Ok(())
}

pub fn translate(
    catalog: &QueryCatalog,
    table: &str,
    op: &QueryOp,
) -> Result<ParameterizedQuery, QueryError> {
    let schema = catalog.schema(table)?;
    let table_ref = catalog.table_ref(schema);
    let query = match op {
        QueryOp::SelectAll => ParameterizedQuery::new(format!(
            "SELECT * FROM {table_ref} LIMIT {SELECT_ROW_CAP}"
        )),
        QueryOp::Insert(payload) => {
            check_payload_columns(schema, payload)?;
            let mut query = ParameterizedQuery::new(String::new());
            let mut placeholders = Vec::with_capacity(schema.columns().len());
            for column in schema.columns() {
                let value = match payload.get(column) {
                    Some(v) => scalar(column, v)?,
                    None => Value::Null,
                };
                placeholders.push(query.bind(format!("{VALUE_PARAM_PREFIX}{column}"), value));
            }
            let column_list = schema
                .columns()
                .iter()
                .map(|c| format!("`{c}`"))
                .collect::<Vec<_>>()
                .join(", ");
            query.sql = format!(
                "INSERT INTO {table_ref} ({column_list}) VALUES ({})",
                placeholders.join(", ")
            );
            query
        }
        QueryOp::UpdateByIdentity { identity, payload } => {
            check_payload_columns(schema, payload)?;
            let mut query = ParameterizedQuery::new(String::new());
            let mut assignments = Vec::new();
            for column in schema.columns() {
                if let Some(v) = payload.get(column) {
                    let placeholder =
                        query.bind(format!("{VALUE_PARAM_PREFIX}{column}"), scalar(column, v)?);
                    assignments.push(format!("`{column}` = {placeholder}"));
                }
            }
            if assignments.is_empty() {
                return Err(QueryError::new(
                    QueryErrorCode::Validation,
                    "update payload sets no columns",
                ));
            }
            let key = query.bind(
                IDENTITY_PARAM.to_string(),
                scalar(schema.identity_column(), identity)?,
            );
            query.sql = format!(
                "UPDATE {table_ref} SET {} WHERE `{}` = {key}",
                assignments.join(", "),
                schema.identity_column()
            );
            query
        }
        QueryOp::DeleteByIdentity(identity) => {
            let mut query = ParameterizedQuery::new(String::new());
            let key = query.bind(
                IDENTITY_PARAM.to_string(),
                scalar(schema.identity_column(), identity)?,
            );
            query.sql = format!(
                "DELETE FROM {table_ref} WHERE `{}` = {key}",
                schema.identity_column()
            );
            query
        }
    };
    tracing::debug!(table, op = op.name(), sql = %query.sql, "translated query");
    Ok(query)
}
