// SPDX-License-Identifier: Apache-2.0

use crate::edit::Draft;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tabledash_api::{CreateResponse, DeleteResponse, UpdateResponse, API_PREFIX};
use tabledash_model::{
    identity_key, same_identity, Dataset, FieldSpec, FieldType, Row, TableConfig,
    RESERVED_ROW_KEY,
};
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced a response.
    Transport(String),
    /// Non-success status, or a body that does not decode.
    Response { status: u16, detail: String },
    /// Rejected locally; nothing was sent.
    Validation(String),
}

impl ClientError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TransportError",
            Self::Response { .. } => "ResponseError",
            Self::Validation(_) => "ValidationError",
        }
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) | Self::Validation(message) => {
                write!(f, "{}: {message}", self.kind())
            }
            Self::Response { status, detail } => {
                write!(f, "{}: status {status}: {detail}", self.kind())
            }
        }
    }
}

impl std::error::Error for ClientError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// One request against the table resource API. `segments` follow the `/api`
/// prefix and are percent-encoded by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRequest {
    pub method: HttpMethod,
    pub segments: Vec<String>,
    pub body: Option<Value>,
}

impl TableRequest {
    #[must_use]
    pub fn new(method: HttpMethod, segments: &[&str], body: Option<Value>) -> Self {
        Self {
            method,
            segments: segments.iter().map(ToString::to_string).collect(),
            body,
        }
    }

    /// Decoded path, e.g. `/api/persons/Mary Ann`.
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = API_PREFIX.to_string();
        for segment in &self.segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Success body decoded as `T`; any other status becomes a response error.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        if !self.is_success() {
            return Err(ClientError::Response {
                status: self.status,
                detail: self.body,
            });
        }
        serde_json::from_str(&self.body).map_err(|e| ClientError::Response {
            status: self.status,
            detail: format!("invalid response body: {e}"),
        })
    }
}

/// Request/response channel to the table resource API.
#[async_trait]
pub trait TableTransport: Send + Sync {
    async fn send(&self, request: TableRequest) -> Result<TransportResponse, ClientError>;
}

pub struct HttpTransport {
    base_url: reqwest::Url,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| ClientError::Validation(format!("invalid api url {base_url}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::Validation(format!(
                "unsupported api url scheme: {}",
                base_url.scheme()
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { base_url, client })
    }

    fn url_for(&self, request: &TableRequest) -> Result<reqwest::Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ClientError::Validation(format!("api url cannot be a base: {}", self.base_url))
            })?;
            path.pop_if_empty()
                .push(API_PREFIX.trim_start_matches('/'))
                .extend(&request.segments);
        }
        Ok(url)
    }
}

#[async_trait]
impl TableTransport for HttpTransport {
    #[instrument(name = "console_http_send", skip_all, fields(method = request.method.as_str(), path = %request.path()))]
    async fn send(&self, request: TableRequest) -> Result<TransportResponse, ClientError> {
        let url = self.url_for(&request)?;
        let builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };
        let resp = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        debug!(status, "table api responded");
        Ok(TransportResponse { status, body })
    }
}

/// How the local dataset follows a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Replace the dataset with a fresh `list()`.
    Refetch,
    /// Apply the sent payload to the local dataset.
    ApplyLocal,
}

/// Per-operation reconciliation. Creates refetch because the store may fill
/// in defaults the draft does not know; updates and deletes are applied
/// locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationPolicy {
    pub create: SyncPolicy,
    pub update: SyncPolicy,
    pub delete: SyncPolicy,
}

impl Default for MutationPolicy {
    fn default() -> Self {
        Self {
            create: SyncPolicy::Refetch,
            update: SyncPolicy::ApplyLocal,
            delete: SyncPolicy::ApplyLocal,
        }
    }
}

/// Fields a create draft must fill: the declared fields, or just the identity
/// column when the table relies on inferred columns.
#[must_use]
pub fn required_fields(config: &TableConfig) -> Vec<FieldSpec> {
    if config.declares_fields() {
        config.fields.clone()
    } else {
        vec![FieldSpec::new(
            config.id_field(),
            FieldType::String,
            config.id_field(),
        )]
    }
}

/// Integer parse of the leading digits, the way form number inputs are read:
/// `"42"`, `" 42 "` and `"42abc"` give 42; `"abc"` gives `None`.
#[must_use]
pub fn parse_leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn invalid(field: &FieldSpec) -> ClientError {
    ClientError::Validation(format!("Please enter a valid {}", field.label))
}

fn coerce(field: Option<&FieldSpec>, text: &str) -> Result<Value, ClientError> {
    match field {
        Some(spec) if spec.field_type == FieldType::Number => parse_leading_integer(text)
            .map(Value::from)
            .ok_or_else(|| invalid(spec)),
        _ => Ok(Value::String(text.to_string())),
    }
}

/// Validated, typed create payload. Every required field must be non-blank.
pub fn create_payload(config: &TableConfig, draft: &Draft) -> Result<Row, ClientError> {
    let mut payload = Row::new();
    for field in required_fields(config) {
        let text = draft.get(&field.name).map(|s| s.trim()).unwrap_or("");
        if text.is_empty() {
            return Err(invalid(&field));
        }
        payload.insert(field.name.clone(), coerce(Some(&field), text)?);
    }
    Ok(payload)
}

/// Typed update payload: every draft column except the synthetic `id`.
pub fn update_payload(config: &TableConfig, draft: &Draft) -> Result<Row, ClientError> {
    let mut payload = Row::new();
    for (column, text) in draft {
        if column == RESERVED_ROW_KEY && config.field(RESERVED_ROW_KEY).is_none() {
            continue;
        }
        payload.insert(column.clone(), coerce(config.field(column), text)?);
    }
    Ok(payload)
}

/// Identity text usable as a single URL path segment. Empty, `.` and `..`
/// segments are collapsed by URL normalisation and would address the
/// collection instead of the row.
pub fn path_key(identifier: &Value) -> Result<String, ClientError> {
    let key = identity_key(identifier);
    if matches!(key.as_str(), "" | "." | "..") {
        return Err(ClientError::Validation(format!(
            "Row identifier {key:?} cannot be addressed by the API"
        )));
    }
    Ok(key)
}

/// CRUD operations for one table, keeping a local copy of its rows.
pub struct CrudClient {
    transport: Arc<dyn TableTransport>,
    table: String,
    config: TableConfig,
    policy: MutationPolicy,
    dataset: Dataset,
}

impl CrudClient {
    #[must_use]
    pub fn new(transport: Arc<dyn TableTransport>, table: &str, config: TableConfig) -> Self {
        Self {
            transport,
            table: table.to_string(),
            config,
            policy: MutationPolicy::default(),
            dataset: Dataset::new(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: MutationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.dataset
    }

    /// Replaces the local dataset with the server's rows.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn list(&mut self) -> Result<&[Row], ClientError> {
        let rows: Dataset = self
            .transport
            .send(TableRequest::new(HttpMethod::Get, &[&self.table], None))
            .await?
            .decode()?;
        debug!(rows = rows.len(), "dataset replaced");
        self.dataset = rows;
        Ok(&self.dataset)
    }

    /// Validates and sends a new row; no request is made when validation fails.
    #[instrument(skip(self, draft), fields(table = %self.table))]
    pub async fn create(&mut self, draft: &Draft) -> Result<(), ClientError> {
        let payload = create_payload(&self.config, draft)?;
        let request = TableRequest::new(
            HttpMethod::Post,
            &[&self.table],
            Some(Value::Object(payload.as_map().clone())),
        );
        let _: CreateResponse = self.transport.send(request).await?.decode()?;
        match self.policy.create {
            SyncPolicy::Refetch => {
                self.list().await?;
            }
            SyncPolicy::ApplyLocal => self.dataset.push(payload),
        }
        Ok(())
    }

    /// Sends the draft for the row originally identified by `identifier`; on
    /// success every local row with that identity absorbs the payload.
    #[instrument(skip(self, draft), fields(table = %self.table, identifier = %identity_key(identifier)))]
    pub async fn update(&mut self, identifier: &Value, draft: &Draft) -> Result<u64, ClientError> {
        let payload = update_payload(&self.config, draft)?;
        let key = path_key(identifier)?;
        let request = TableRequest::new(
            HttpMethod::Put,
            &[&self.table, &key],
            Some(Value::Object(payload.as_map().clone())),
        );
        let resp: UpdateResponse = self.transport.send(request).await?.decode()?;
        match self.policy.update {
            SyncPolicy::Refetch => {
                self.list().await?;
            }
            SyncPolicy::ApplyLocal => {
                for row in &mut self.dataset {
                    if same_identity(row, &self.config, identifier) {
                        row.merge(&payload);
                    }
                }
            }
        }
        Ok(resp.rows_updated)
    }

    /// Deletes by identity; on success rows with that identity leave the dataset.
    #[instrument(skip(self), fields(table = %self.table, identifier = %identity_key(identifier)))]
    pub async fn delete(&mut self, identifier: &Value) -> Result<String, ClientError> {
        let key = path_key(identifier)?;
        let resp: DeleteResponse = self
            .transport
            .send(TableRequest::new(HttpMethod::Delete, &[&self.table, &key], None))
            .await?
            .decode()?;
        match self.policy.delete {
            SyncPolicy::Refetch => {
                self.list().await?;
            }
            SyncPolicy::ApplyLocal => {
                let config = &self.config;
                self.dataset
                    .retain(|row| !same_identity(row, config, identifier));
            }
        }
        Ok(resp.message)
    }
}
