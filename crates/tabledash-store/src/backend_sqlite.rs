// SPDX-License-Identifier: Apache-2.0

use crate::{QueryOutcome, StoreError, StoreErrorCode, TabularStore};
use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, ToSql};
use serde_json::{Number, Value};
use std::fmt::Display;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tabledash_model::Row;
use tabledash_query::ParameterizedQuery;
use tracing::instrument;

/// Local query service over one SQLite connection.
///
/// Statements run on the blocking pool; the connection mutex serialises them.
/// With a dataset configured, tables are stored as `<dataset>.<table>` so the
/// translator's qualified references resolve unchanged.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    dataset: Option<String>,
}

fn sql_err(e: impl Display) -> StoreError {
    StoreError::new(StoreErrorCode::Query, e.to_string())
}

impl SqliteStore {
    #[must_use]
    pub fn new(conn: Connection, dataset: Option<String>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            dataset,
        }
    }

    pub fn open(path: &Path, dataset: Option<String>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(sql_err)?;
        Ok(Self::new(conn, dataset))
    }

    pub fn in_memory(dataset: Option<String>) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(sql_err)?;
        Ok(Self::new(conn, dataset))
    }

    /// Runs a trusted multi-statement script (fixtures, local seeding).
    pub async fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::new(StoreErrorCode::Internal, "connection lock poisoned"))?;
            guard.execute_batch(&sql).map_err(sql_err)
        })
        .await
        .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn to_json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            Value::String(String::from_utf8_lossy(t).into_owned())
        }
    }
}

fn run_query(conn: &Connection, query: &ParameterizedQuery) -> Result<QueryOutcome, StoreError> {
    let mut stmt = conn.prepare(&query.sql).map_err(sql_err)?;
    let names: Vec<String> = query.params.iter().map(|p| format!("@{}", p.name)).collect();
    let values: Vec<SqlValue> = query.params.iter().map(|p| to_sql_value(&p.value)).collect();
    let bound: Vec<(&str, &dyn ToSql)> = names
        .iter()
        .zip(values.iter())
        .map(|(n, v)| (n.as_str(), v as &dyn ToSql))
        .collect();

    if stmt.column_count() == 0 {
        let affected = stmt.execute(bound.as_slice()).map_err(sql_err)?;
        return Ok(QueryOutcome {
            rows: Vec::new(),
            affected_rows: affected as u64,
        });
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(bound.as_slice()).map_err(sql_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(sql_err)? {
        let mut decoded = Row::new();
        for (idx, column) in columns.iter().enumerate() {
            let value = row.get_ref(idx).map_err(sql_err)?;
            decoded.insert(column.clone(), to_json_value(value));
        }
        out.push(decoded);
    }
    Ok(QueryOutcome {
        rows: out,
        affected_rows: 0,
    })
}

#[async_trait]
impl TabularStore for SqliteStore {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(name = "store_sqlite_execute", skip_all, fields(sql = %query.sql))]
    async fn execute(&self, query: &ParameterizedQuery) -> Result<QueryOutcome, StoreError> {
        let conn = Arc::clone(&self.conn);
        let query = query.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::new(StoreErrorCode::Internal, "connection lock poisoned"))?;
            run_query(&guard, &query)
        })
        .await
        .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?
    }

    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let conn = Arc::clone(&self.conn);
        let prefix = self.dataset.as_ref().map(|d| format!("{d}."));
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::new(StoreErrorCode::Internal, "connection lock poisoned"))?;
            let mut stmt = guard
                .prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )
                .map_err(sql_err)?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(sql_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(sql_err)?;
            Ok(match prefix {
                Some(prefix) => names
                    .into_iter()
                    .filter_map(|n| n.strip_prefix(&prefix).map(ToString::to_string))
                    .collect(),
                None => names,
            })
        })
        .await
        .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_values_map_to_sqlite_storage_classes() {
        assert_eq!(to_sql_value(&json!(3)), SqlValue::Integer(3));
        assert_eq!(to_sql_value(&json!(1.5)), SqlValue::Real(1.5));
        assert_eq!(to_sql_value(&json!(true)), SqlValue::Integer(1));
        assert_eq!(to_sql_value(&json!("x")), SqlValue::Text("x".to_string()));
        assert_eq!(to_sql_value(&Value::Null), SqlValue::Null);
    }

    #[test]
    fn sqlite_values_map_back_to_json() {
        assert_eq!(to_json_value(ValueRef::Integer(7)), json!(7));
        assert_eq!(to_json_value(ValueRef::Text(b"abc")), json!("abc"));
        assert_eq!(to_json_value(ValueRef::Null), Value::Null);
    }
}
