// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::request_id;
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tabledash_api::error_mapping::map_error;
use tabledash_api::{ApiError, ApiErrorCode, TestResponse};
use tracing::error;

pub(crate) fn api_error_response(headers: &HeaderMap, err: ApiError) -> Response {
    let status =
        StatusCode::from_u16(map_error(&err)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let err = match request_id(headers) {
        Some(id) => err.with_request_id(id),
        None => err,
    };
    (status, Json(err)).into_response()
}

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn test_handler() -> Json<TestResponse> {
    Json(TestResponse::default())
}

/// Table names the store reports for the configured dataset.
pub(crate) async fn tables_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.store.list_tables().await {
        Ok(names) => Json(names).into_response(),
        Err(err) => {
            error!(backend = state.store.backend_tag(), error = %err, "listing tables failed");
            api_error_response(
                &headers,
                ApiError::new(
                    ApiErrorCode::StoreError,
                    "Failed to fetch tables",
                    Some(serde_json::Value::String(err.message)),
                ),
            )
        }
    }
}
