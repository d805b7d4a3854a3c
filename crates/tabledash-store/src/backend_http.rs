// SPDX-License-Identifier: Apache-2.0

use crate::{QueryOutcome, StoreError, StoreErrorCode, TabularStore};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tabledash_model::Row;
use tabledash_query::ParameterizedQuery;
use tracing::instrument;

#[derive(Debug, Serialize)]
struct QueryRequestBody<'a> {
    query: &'a str,
    params: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponseBody {
    #[serde(default)]
    rows: Vec<Row>,
    #[serde(default)]
    affected_rows: u64,
}

/// Remote query service speaking JSON over HTTP.
///
/// `POST <base>/query` with `{query, params}` answers `{rows, affectedRows}`;
/// `GET <base>/tables` answers an array of table names.
pub struct HttpQueryStore {
    base_url: String,
    auth_bearer: Option<String>,
    client: reqwest::Client,
}

impl HttpQueryStore {
    pub fn new(base_url: &str, auth_bearer: Option<String>, timeout: Duration) -> Result<Self, StoreError> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, format!("invalid store url: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreError::new(
                StoreErrorCode::Internal,
                format!("unsupported store url scheme: {}", parsed.scheme()),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_bearer: auth_bearer.filter(|t| !t.is_empty()),
            client,
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.auth_bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                StoreError::new(StoreErrorCode::Internal, format!("invalid auth header: {e}"))
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn read_failure(resp: reqwest::Response) -> StoreError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        StoreError::new(
            StoreErrorCode::Query,
            format!("query service returned status={status}: {body}"),
        )
    }
}

#[async_trait]
impl TabularStore for HttpQueryStore {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    #[instrument(name = "store_http_execute", skip_all, fields(sql = %query.sql))]
    async fn execute(&self, query: &ParameterizedQuery) -> Result<QueryOutcome, StoreError> {
        let body = QueryRequestBody {
            query: &query.sql,
            params: query
                .params
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect(),
        };
        let resp = self
            .client
            .post(format!("{}/query", self.base_url))
            .headers(self.auth_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::new(StoreErrorCode::Network, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::read_failure(resp).await);
        }
        let decoded: QueryResponseBody = resp
            .json()
            .await
            .map_err(|e| StoreError::new(StoreErrorCode::Decode, e.to_string()))?;
        Ok(QueryOutcome {
            rows: decoded.rows,
            affected_rows: decoded.affected_rows,
        })
    }

    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let resp = self
            .client
            .get(format!("{}/tables", self.base_url))
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(|e| StoreError::new(StoreErrorCode::Network, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::read_failure(resp).await);
        }
        resp.json()
            .await
            .map_err(|e| StoreError::new(StoreErrorCode::Decode, e.to_string()))
    }
}
