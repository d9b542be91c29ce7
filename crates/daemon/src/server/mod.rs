// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP Surface (C6): the Client, Worker, and Realtime APIs composed into
//! one Axum router, wrapped in tracing/CORS/auth middleware (§4.6).

pub mod client;
pub mod error;
pub mod realtime;
pub mod worker;

use axum::middleware;
use axum::Router;
use oj_core::Clock;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::require_bearer;
use crate::state::AppState;

pub fn build<C: Clock + 'static>(state: AppState<C>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let auth = middleware::from_fn_with_state(state.clone(), require_bearer::<C, _>);

    client::router::<C>()
        .merge(worker::router::<C>())
        .merge(realtime::router::<C>())
        .route_layer(auth)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(tower_http::cors::Any).allow_headers(tower_http::cors::Any);
    if origins.is_empty() {
        layer.allow_origin(tower_http::cors::Any)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}
