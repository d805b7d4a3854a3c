// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    ValidationFailed,
    UnknownTable,
    UnknownColumn,
    InvalidPayload,
    PayloadTooLarge,
    StoreError,
}

impl ApiErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "ValidationFailed",
            Self::UnknownTable => "UnknownTable",
            Self::UnknownColumn => "UnknownColumn",
            Self::InvalidPayload => "InvalidPayload",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::StoreError => "StoreError",
        }
    }
}

/// Failure body: `{error, kind, details?, request_id?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub kind: ApiErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ApiError {
    #[must_use]
    pub fn new(kind: ApiErrorCode, error: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            error: error.into(),
            kind,
            details,
            request_id: None,
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn required_field(field: &str) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            format!("{field} is required"),
            None,
        )
    }

    #[must_use]
    pub fn unknown_table(table: &str) -> Self {
        Self::new(
            ApiErrorCode::UnknownTable,
            format!("unknown table: {table}"),
            None,
        )
    }

    #[must_use]
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::InvalidPayload,
            "request body must be a JSON object",
            Some(Value::String(reason.into())),
        )
    }

    /// Store execution failure for one operation, e.g. `INSERT failed`.
    #[must_use]
    pub fn store_failed(operation: &str, message: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::StoreError,
            format!("{operation} failed"),
            Some(Value::String(message.into())),
        )
    }

    /// Listing failure for one table.
    #[must_use]
    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::StoreError,
            "Failed to fetch data",
            Some(Value::String(message.into())),
        )
    }

    #[must_use]
    pub fn payload_too_large(limit_detail: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::PayloadTooLarge,
            "request body too large",
            Some(Value::String(limit_detail.into())),
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.details {
            Some(Value::String(detail)) => write!(f, "{}: {}", self.error, detail),
            Some(detail) => write!(f, "{}: {}", self.error, detail),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for ApiError {}
