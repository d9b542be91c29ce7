// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional bearer-token auth (§6, §6.5), applied only to mutating routes.
//! Read-only `GET`s stay open even when auth is enabled — "protect writes,
//! allow reads" — per the Client/Worker API table in §6.

use axum::extract::State;
use axum::http::{header, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use oj_core::Clock;
use serde_json::json;

use crate::state::AppState;

/// `from_fn_with_state` middleware applied to the whole router: rejects with
/// 401 when `AUTH_ENABLED` but no/incorrect bearer token is presented.
///
/// Every mutating Client/Worker API route is a non-`GET` method (§6.1,
/// §6.2), so gating on method rather than maintaining a side list of
/// "mutating paths" gives the same "protect writes, allow reads" posture
/// with no risk of the list drifting from the route table.
pub async fn require_bearer<C: Clock + 'static, B>(
    State(state): State<AppState<C>>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    if request.method() == Method::GET || !state.config.auth_enabled {
        return next.run(request).await;
    }

    let Some(expected) = state.config.auth_bearer_token.as_deref() else {
        return next.run(request).await;
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => next.run(request).await,
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "missing or invalid bearer token" }))).into_response(),
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
