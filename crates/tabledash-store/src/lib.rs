#![forbid(unsafe_code)]
//! Tabular query service backends.
//!
//! A store accepts one [`ParameterizedQuery`] per request and answers with
//! rows or an affected-row count. Nothing is retried here.

mod backend_http;
mod backend_sqlite;

use async_trait::async_trait;
use std::fmt::{Display, Formatter};
use tabledash_model::Row;
use tabledash_query::ParameterizedQuery;

pub use backend_http::HttpQueryStore;
pub use backend_sqlite::SqliteStore;

pub const CRATE_NAME: &str = "tabledash-store";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    Network,
    Query,
    Decode,
    Internal,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network_error",
            Self::Query => "query_error",
            Self::Decode => "decode_error",
            Self::Internal => "internal_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryOutcome {
    pub rows: Vec<Row>,
    pub affected_rows: u64,
}

#[async_trait]
pub trait TabularStore: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str;

    async fn execute(&self, query: &ParameterizedQuery) -> Result<QueryOutcome, StoreError>;

    async fn list_tables(&self) -> Result<Vec<String>, StoreError>;
}
