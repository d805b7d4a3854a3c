// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};
use tabledash_query::{QueryError, QueryErrorCode};

impl From<&QueryError> for ApiError {
    fn from(err: &QueryError) -> Self {
        let kind = match err.code {
            QueryErrorCode::UnknownTable => ApiErrorCode::UnknownTable,
            QueryErrorCode::UnknownColumn => ApiErrorCode::UnknownColumn,
            _ => ApiErrorCode::ValidationFailed,
        };
        Self::new(kind, err.message.clone(), None)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self::from(&err)
    }
}
