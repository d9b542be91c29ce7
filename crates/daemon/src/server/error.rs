// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps [`CoordinatorError`] onto HTTP status codes and the `{"detail": …}`
//! body shape every endpoint uses (§7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use oj_core::CoordinatorError;
use serde_json::json;
use tracing::error;

/// Newtype so `oj-daemon` (the only crate depending on Axum) can implement
/// `IntoResponse` for a type it doesn't own.
pub struct ApiError(pub CoordinatorError);

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoordinatorError::Validation(_) => StatusCode::BAD_REQUEST,
            CoordinatorError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoordinatorError::Conflict(_) => StatusCode::CONFLICT,
            CoordinatorError::BadState(_) => StatusCode::BAD_REQUEST,
            CoordinatorError::Forbidden { .. } => StatusCode::FORBIDDEN,
            CoordinatorError::NoEligibleWorker { .. } => StatusCode::BAD_REQUEST,
            CoordinatorError::WorkerLost { .. } => StatusCode::BAD_REQUEST,
            CoordinatorError::Internal(err) => {
                error!(%err, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let detail = match &self.0 {
            CoordinatorError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
