// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

pub const TEST_MESSAGE: &str = "Server is working correctly";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub success: bool,
    pub rows_updated: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    #[must_use]
    pub fn for_count(deleted: u64) -> Self {
        Self {
            success: true,
            message: format!("Deleted {deleted} row(s)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResponse {
    pub message: String,
}

impl Default for TestResponse {
    fn default() -> Self {
        Self {
            message: TEST_MESSAGE.to_string(),
        }
    }
}
