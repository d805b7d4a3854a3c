// SPDX-License-Identifier: Apache-2.0

use serde_json::json;
use tabledash_api::error_mapping::{map_error, status_code};
use tabledash_api::{ApiError, ApiErrorCode, DeleteResponse, UpdateResponse};
use tabledash_query::QueryError;

#[test]
fn error_status_mapping_is_centralized_and_stable() {
    assert_eq!(map_error(&ApiError::required_field("bundle_name")), 400);
    assert_eq!(map_error(&ApiError::unknown_table("users")), 404);
    assert_eq!(map_error(&ApiError::store_failed("INSERT", "boom")), 500);
    assert_eq!(map_error(&ApiError::payload_too_large("length limit exceeded")), 413);
    assert_eq!(status_code(ApiErrorCode::StoreError), 500);
}

#[test]
fn required_field_body_matches_wire_shape() {
    let body = serde_json::to_value(ApiError::required_field("bundle_name")).expect("encode");
    assert_eq!(
        body,
        json!({"error": "bundle_name is required", "kind": "ValidationFailed"})
    );
}

#[test]
fn store_failure_carries_operation_and_detail() {
    let err = ApiError::store_failed("DELETE", "no such table").with_request_id("req-1");
    let body = serde_json::to_value(&err).expect("encode");
    assert_eq!(
        body,
        json!({
            "error": "DELETE failed",
            "kind": "StoreError",
            "details": "no such table",
            "request_id": "req-1"
        })
    );
    assert_eq!(err.to_string(), "DELETE failed: no such table");
}

#[test]
fn list_failure_keeps_fetch_wording() {
    let body = serde_json::to_value(ApiError::fetch_failed("no such table")).expect("encode");
    assert_eq!(
        body,
        json!({"error": "Failed to fetch data", "kind": "StoreError", "details": "no such table"})
    );
}

#[test]
fn oversized_body_reports_payload_too_large_kind() {
    let body = serde_json::to_value(ApiError::payload_too_large("length limit exceeded"))
        .expect("encode");
    assert_eq!(body["kind"], "PayloadTooLarge");
    assert_eq!(body["error"], "request body too large");
}

#[test]
fn query_errors_map_to_endpoint_kinds() {
    let err = ApiError::from(QueryError::unknown_table("users"));
    assert_eq!(err.kind, ApiErrorCode::UnknownTable);
    let err = ApiError::from(QueryError::unknown_column("persons", "salary"));
    assert_eq!(err.kind, ApiErrorCode::UnknownColumn);
    assert_eq!(map_error(&err), 400);
}

#[test]
fn mutation_responses_use_camel_case_counts() {
    let update = UpdateResponse {
        success: true,
        rows_updated: 2,
    };
    assert_eq!(
        serde_json::to_value(update).expect("encode"),
        json!({"success": true, "rowsUpdated": 2})
    );
    assert_eq!(
        serde_json::to_value(DeleteResponse::for_count(0)).expect("encode"),
        json!({"success": true, "message": "Deleted 0 row(s)"})
    );
}
