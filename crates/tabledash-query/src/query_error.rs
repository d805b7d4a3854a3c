// SPDX-License-Identifier: Apache-2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryErrorCode {
    Validation,
    UnknownTable,
    UnknownColumn,
}

impl QueryErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "Validation",
            Self::UnknownTable => "UnknownTable",
            Self::UnknownColumn => "UnknownColumn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub code: QueryErrorCode,
    pub message: String,
}

impl QueryError {
    #[must_use]
    pub fn new(code: QueryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unknown_table(table: &str) -> Self {
        Self::new(
            QueryErrorCode::UnknownTable,
            format!("table is not registered: {table}"),
        )
    }

    #[must_use]
    pub fn unknown_column(table: &str, column: &str) -> Self {
        Self::new(
            QueryErrorCode::UnknownColumn,
            format!("column `{column}` is not allowed for table {table}"),
        )
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for QueryError {}
