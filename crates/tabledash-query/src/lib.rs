#![forbid(unsafe_code)]
//! CRUD query translation.
//!
//! Table and column names come only from a [`QueryCatalog`] allow-list built at
//! startup; every user-supplied value travels as a named bound parameter.

mod catalog;
mod query_error;
mod translate;

pub use catalog::{is_valid_identifier, QueryCatalog, TableSchema};
pub use query_error::{QueryError, QueryErrorCode};
pub use translate::{translate, ParameterizedQuery, QueryOp, QueryParam, IDENTITY_PARAM};

pub const CRATE_NAME: &str = "tabledash-query";

/// Row cap applied to every list read. There is no pagination token.
pub const SELECT_ROW_CAP: usize = 100;
