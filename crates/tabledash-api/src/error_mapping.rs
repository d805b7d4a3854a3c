// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};

#[must_use]
pub const fn status_code(code: ApiErrorCode) -> u16 {
    match code {
        ApiErrorCode::ValidationFailed
        | ApiErrorCode::UnknownColumn
        | ApiErrorCode::InvalidPayload => 400,
        ApiErrorCode::UnknownTable => 404,
        ApiErrorCode::PayloadTooLarge => 413,
        ApiErrorCode::StoreError => 500,
    }
}

#[must_use]
pub fn map_error(error: &ApiError) -> u16 {
    status_code(error.kind)
}
