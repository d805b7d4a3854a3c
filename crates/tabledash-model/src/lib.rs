#![forbid(unsafe_code)]
//! Table model SSOT.
//!
//! Per-table configuration (identity field, declared columns), the row shape
//! shared by the console and the server, and identity resolution.

mod identity;
mod registry;
mod row;

pub use identity::{
    assign_synthetic_ids, duplicate_identities, identify, identity_key, same_identity,
};
pub use registry::{
    FieldSpec, FieldType, TableConfig, TableRegistry, BUILTIN_CRITICAL_DAGS, BUILTIN_PERSONS,
    DEFAULT_ID_FIELD,
};
pub use row::{cell_text, Dataset, Row, RESERVED_ROW_KEY};

pub const CRATE_NAME: &str = "tabledash-model";

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}
