// SPDX-License-Identifier: Apache-2.0

use crate::http::handlers::api_error_response;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tabledash_api::{ApiError, CreateResponse, DeleteResponse, UpdateResponse};
use tabledash_model::{assign_synthetic_ids, FieldType, Row, TableConfig, RESERVED_ROW_KEY};
use tabledash_query::{translate, QueryOp};
use tabledash_store::QueryOutcome;
use tracing::{error, info};

fn respond<T: Serialize>(headers: &HeaderMap, result: Result<T, ApiError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => api_error_response(headers, err),
    }
}

fn registered<'a>(state: &'a AppState, table: &str) -> Result<&'a TableConfig, ApiError> {
    if state.registry.is_registered(table) {
        Ok(state.registry.lookup(table))
    } else {
        Err(ApiError::unknown_table(table))
    }
}

async fn run(state: &AppState, table: &str, op: &QueryOp) -> Result<QueryOutcome, ApiError> {
    let query = translate(&state.catalog, table, op)?;
    state.store.execute(&query).await.map_err(|err| {
        error!(table, op = op.name(), error = %err, "store query failed");
        match op {
            QueryOp::SelectAll => ApiError::fetch_failed(err.message),
            _ => ApiError::store_failed(op.name(), err.message),
        }
    })
}

/// Buffered body, or the rejection as a JSON error (413 past the body limit).
fn buffered(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(rejection.body_text())
        } else {
            ApiError::invalid_payload(rejection.body_text())
        }
    })
}

/// Decodes a JSON object body; the synthetic `id` key never reaches the store.
fn parse_payload(config: &TableConfig, body: &Bytes) -> Result<Row, ApiError> {
    let payload: Row =
        serde_json::from_slice(body).map_err(|e| ApiError::invalid_payload(e.to_string()))?;
    if config.field(RESERVED_ROW_KEY).is_some() {
        Ok(payload)
    } else {
        Ok(payload.without_reserved_key())
    }
}

fn check_required(config: &TableConfig, payload: &Row) -> Result<(), ApiError> {
    for field in &config.fields {
        let missing = match payload.get(&field.name) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            return Err(ApiError::required_field(&field.name));
        }
    }
    Ok(())
}

/// Path identifier as a query value; numeric identity columns bind numbers.
fn identity_value(config: &TableConfig, identifier: &str) -> Value {
    let numeric = config
        .field(config.id_field())
        .is_some_and(|f| f.field_type == FieldType::Number);
    if numeric {
        if let Ok(n) = identifier.trim().parse::<i64>() {
            return Value::from(n);
        }
    }
    Value::String(identifier.to_string())
}

async fn list_rows(state: &AppState, table: &str) -> Result<Vec<Row>, ApiError> {
    let config = registered(state, table)?;
    let outcome = run(state, table, &QueryOp::SelectAll).await?;
    Ok(assign_synthetic_ids(outcome.rows, config.id_field()))
}

async fn create_row(
    state: &AppState,
    table: &str,
    body: Result<Bytes, BytesRejection>,
) -> Result<CreateResponse, ApiError> {
    let config = registered(state, table)?;
    let payload = parse_payload(config, &buffered(body)?)?;
    check_required(config, &payload)?;
    run(state, table, &QueryOp::Insert(payload)).await?;
    info!(table, "row inserted");
    Ok(CreateResponse { success: true })
}

async fn update_row(
    state: &AppState,
    table: &str,
    identifier: &str,
    body: Result<Bytes, BytesRejection>,
) -> Result<UpdateResponse, ApiError> {
    let config = registered(state, table)?;
    let payload = parse_payload(config, &buffered(body)?)?;
    let op = QueryOp::UpdateByIdentity {
        identity: identity_value(config, identifier),
        payload,
    };
    let outcome = run(state, table, &op).await?;
    info!(table, identifier, rows_updated = outcome.affected_rows, "rows updated");
    Ok(UpdateResponse {
        success: true,
        rows_updated: outcome.affected_rows,
    })
}

async fn delete_row(state: &AppState, table: &str, identifier: &str) -> Result<DeleteResponse, ApiError> {
    let config = registered(state, table)?;
    let op = QueryOp::DeleteByIdentity(identity_value(config, identifier));
    let outcome = run(state, table, &op).await?;
    info!(table, identifier, rows_deleted = outcome.affected_rows, "rows deleted");
    Ok(DeleteResponse::for_count(outcome.affected_rows))
}

pub(crate) async fn list_rows_handler(
    State(state): State<AppState>,
    Path(table): Path<String>,
    headers: HeaderMap,
) -> Response {
    respond(&headers, list_rows(&state, &table).await)
}

pub(crate) async fn create_row_handler(
    State(state): State<AppState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    respond(&headers, create_row(&state, &table, body).await)
}

pub(crate) async fn update_row_handler(
    State(state): State<AppState>,
    Path((table, identifier)): Path<(String, String)>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    respond(&headers, update_row(&state, &table, &identifier, body).await)
}

pub(crate) async fn delete_row_handler(
    State(state): State<AppState>,
    Path((table, identifier)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    respond(&headers, delete_row(&state, &table, &identifier).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabledash_model::TableRegistry;

    fn registry() -> TableRegistry {
        TableRegistry::builtin()
    }

    #[test]
    fn required_fields_reject_blank_and_missing_values() {
        let registry = registry();
        let config = registry.lookup("critical_dags");
        let blank: Row = serde_json::from_value(json!({"bundle_name": "  "})).expect("row");
        let err = check_required(config, &blank).expect_err("blank");
        assert_eq!(err.error, "bundle_name is required");
        assert!(check_required(config, &Row::new()).is_err());

        let persons = registry.lookup("persons");
        let partial: Row = serde_json::from_value(json!({"name": "A", "age": 0})).expect("row");
        let err = check_required(persons, &partial).expect_err("location");
        assert_eq!(err.error, "location is required");
    }

    #[test]
    fn payload_drops_synthetic_id_and_rejects_non_objects() {
        let registry = registry();
        let config = registry.lookup("persons");
        let row = parse_payload(config, &Bytes::from_static(br#"{"id":"row-0","name":"A"}"#))
            .expect("payload");
        assert!(!row.contains("id"));
        assert!(parse_payload(config, &Bytes::from_static(b"[1,2]")).is_err());
    }

    #[test]
    fn identity_value_follows_identity_column_type() {
        let registry = TableRegistry::from_json_str(
            r#"{"jobs":{"idField":"job_id","fields":[{"name":"job_id","type":"number","label":"Job"}]}}"#,
        )
        .expect("registry");
        assert_eq!(identity_value(registry.lookup("jobs"), "42"), json!(42));
        assert_eq!(identity_value(registry.lookup("jobs"), "x"), json!("x"));
        assert_eq!(
            identity_value(TableRegistry::builtin().lookup("persons"), "42"),
            json!("42")
        );
    }
}
