// SPDX-License-Identifier: Apache-2.0
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;
use tabledash_console::{ClientError, HttpMethod, TableRequest, TableTransport, TransportResponse};
use tabledash_model::{identity_key, Row};

/// In-memory table API: one table, identity column `id_field`.
pub struct FakeTableApi {
    id_field: String,
    rows: Mutex<Vec<Row>>,
    requests: Mutex<Vec<TableRequest>>,
    failure: Mutex<Option<TransportFailure>>,
}

#[derive(Debug, Clone)]
pub enum TransportFailure {
    Unreachable,
    Status(u16, String),
}

pub fn row(v: Value) -> Row {
    serde_json::from_value(v).expect("row")
}

fn ok(body: Value) -> TransportResponse {
    TransportResponse {
        status: 200,
        body: body.to_string(),
    }
}

impl FakeTableApi {
    pub fn new(id_field: &str, rows: Vec<Value>) -> Self {
        Self {
            id_field: id_field.to_string(),
            rows: Mutex::new(rows.into_iter().map(row).collect()),
            requests: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn fail_next(&self, failure: TransportFailure) {
        *self.failure.lock().expect("lock") = Some(failure);
    }

    pub fn requests(&self) -> Vec<TableRequest> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn methods(&self) -> Vec<HttpMethod> {
        self.requests().iter().map(|r| r.method).collect()
    }

    pub fn server_rows(&self) -> Vec<Row> {
        self.rows.lock().expect("lock").clone()
    }

    /// Changes server state behind the client's back.
    pub fn insert_server_row(&self, v: Value) {
        self.rows.lock().expect("lock").push(row(v));
    }

    fn matches(&self, r: &Row, key: &str) -> bool {
        r.get(&self.id_field)
            .filter(|v| !v.is_null())
            .is_some_and(|v| identity_key(v) == key)
    }
}

#[async_trait]
impl TableTransport for FakeTableApi {
    async fn send(&self, request: TableRequest) -> Result<TransportResponse, ClientError> {
        self.requests.lock().expect("lock").push(request.clone());
        if let Some(failure) = self.failure.lock().expect("lock").take() {
            return match failure {
                TransportFailure::Unreachable => {
                    Err(ClientError::Transport("connection refused".to_string()))
                }
                TransportFailure::Status(status, body) => Ok(TransportResponse { status, body }),
            };
        }
        let mut rows = self.rows.lock().expect("lock");
        let segments: Vec<&str> = request.segments.iter().map(String::as_str).collect();
        let body = request
            .body
            .clone()
            .map(|b| serde_json::from_value::<Row>(b).expect("object body"));
        Ok(match (request.method, segments.as_slice()) {
            (HttpMethod::Get, ["tables"]) => ok(json!(["critical_dags", "persons"])),
            (HttpMethod::Get, [_]) => ok(serde_json::to_value(&*rows).expect("rows")),
            (HttpMethod::Post, [_]) => {
                let mut created = body.unwrap_or_default();
                created.insert("created_by", json!("server"));
                rows.push(created);
                ok(json!({"success": true}))
            }
            (HttpMethod::Put, [_, key]) => {
                let patch = body.unwrap_or_default();
                let mut n = 0;
                for r in rows.iter_mut().filter(|r| self.matches(r, key)) {
                    r.merge(&patch);
                    n += 1;
                }
                ok(json!({"success": true, "rowsUpdated": n}))
            }
            (HttpMethod::Delete, [_, key]) => {
                let before = rows.len();
                rows.retain(|r| !self.matches(r, key));
                ok(json!({"success": true, "message": format!("Deleted {} row(s)", before - rows.len())}))
            }
            _ => TransportResponse {
                status: 404,
                body: "not found".to_string(),
            },
        })
    }
}
