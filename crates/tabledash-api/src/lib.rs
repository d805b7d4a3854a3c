#![forbid(unsafe_code)]
//! Wire contract shared by the table resource endpoint and its clients.

pub mod convert;
pub mod dto;
pub mod error_mapping;
pub mod errors;

pub use dto::{CreateResponse, DeleteResponse, TestResponse, UpdateResponse, TEST_MESSAGE};
pub use errors::{ApiError, ApiErrorCode};

pub const CRATE_NAME: &str = "tabledash-api";

/// Route prefix for every table resource.
pub const API_PREFIX: &str = "/api";
