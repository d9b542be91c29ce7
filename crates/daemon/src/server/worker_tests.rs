// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request as HttpRequest;
use oj_core::{ExecutionMode, FakeClock};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn harness() -> (Router, AppState<FakeClock>) {
    let pool = oj_storage::connect(":memory:").await.expect("connect");
    let store = std::sync::Arc::new(oj_storage::SessionStore::new(pool));
    let config = crate::config::Config {
        listen_addr: "127.0.0.1:0".to_string(),
        db_path: ":memory:".to_string(),
        long_poll: std::time::Duration::from_millis(50),
        heartbeat_timeout: chrono::Duration::seconds(120),
        worker_stale_after: chrono::Duration::seconds(120),
        worker_remove_after: chrono::Duration::seconds(600),
        no_match_timeout: chrono::Duration::seconds(300),
        reaper_interval: std::time::Duration::from_secs(10),
        cors_origins: Vec::new(),
        auth_enabled: false,
        auth_bearer_token: None,
    };
    let state = AppState::new(store, FakeClock::new(), config);
    (router::<FakeClock>().with_state(state.clone()), state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn register_returns_a_worker_id_and_poll_endpoint() {
    let (app, _state) = harness().await;
    let request = HttpRequest::post("/worker/register")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "hostname": "host-a", "project_dir": "/srv", "executor_profile": "default" })).expect("body"),
        ))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["poll_endpoint"], "/worker/runs");
    assert!(body["worker_id"].as_str().is_some());
}

#[tokio::test]
async fn register_twice_with_same_identity_reconnects() {
    let (app, _state) = harness().await;
    let payload = json!({ "hostname": "host-a", "project_dir": "/srv", "executor_profile": "default" });

    let first = app
        .clone()
        .oneshot(
            HttpRequest::post("/worker/register")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&payload).expect("body")))
                .expect("request"),
        )
        .await
        .expect("response");
    let first_body = body_json(first).await;

    let second = app
        .oneshot(
            HttpRequest::post("/worker/register")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&payload).expect("body")))
                .expect("request"),
        )
        .await
        .expect("response");
    let second_body = body_json(second).await;

    assert_eq!(first_body["worker_id"], second_body["worker_id"]);
}

#[tokio::test]
async fn poll_with_no_work_returns_204() {
    let (app, state) = harness().await;
    let worker = state
        .registry
        .register(crate::registry::RegisterRequest {
            hostname: "host-a".to_string(),
            project_dir: "/srv".to_string(),
            executor_profile: "default".to_string(),
            tags: Default::default(),
            require_matching_tags: false,
            owned_agents: Default::default(),
        })
        .expect("register");

    let request = HttpRequest::get(format!("/worker/runs?worker_id={}", worker.worker_id)).body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn poll_delivers_a_matching_run() {
    let (app, state) = harness().await;
    let worker = state
        .registry
        .register(crate::registry::RegisterRequest {
            hostname: "host-a".to_string(),
            project_dir: "/srv".to_string(),
            executor_profile: "default".to_string(),
            tags: Default::default(),
            require_matching_tags: false,
            owned_agents: Default::default(),
        })
        .expect("register");
    let id = oj_core::SessionId::new();
    state
        .store
        .create_session(id.clone(), chrono::Utc::now(), None, None, None, ExecutionMode::AsyncPoll)
        .await
        .expect("create");
    state.queue.enqueue(oj_core::Run::new_start(id, Default::default(), chrono::Utc::now()));

    let request = HttpRequest::get(format!("/worker/runs?worker_id={}", worker.worker_id)).body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["run"].is_object());
}

#[tokio::test]
async fn heartbeat_for_unknown_worker_is_404() {
    let (app, _state) = harness().await;
    let request = HttpRequest::post("/worker/heartbeat")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&json!({ "worker_id": "wrkr_doesnotexist" })).expect("body")))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deregister_without_self_query_is_rejected() {
    let (app, state) = harness().await;
    let worker = state
        .registry
        .register(crate::registry::RegisterRequest {
            hostname: "host-a".to_string(),
            project_dir: "/srv".to_string(),
            executor_profile: "default".to_string(),
            tags: Default::default(),
            require_matching_tags: false,
            owned_agents: Default::default(),
        })
        .expect("register");

    let request = HttpRequest::delete(format!("/workers/{}", worker.worker_id)).body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bind_session_transitions_it_to_running() {
    let (app, state) = harness().await;
    let id = oj_core::SessionId::new();
    state
        .store
        .create_session(id.clone(), chrono::Utc::now(), None, None, None, ExecutionMode::AsyncPoll)
        .await
        .expect("create");

    let request = HttpRequest::post(format!("/sessions/{id}/bind"))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "executor_session_id": "exec-1", "hostname": "host-a", "executor_profile": "default" }))
                .expect("body"),
        ))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let session = state.store.get_session(&id).await.expect("get");
    assert_eq!(session.status, oj_core::SessionStatus::Running);
}

#[tokio::test]
async fn append_event_persists_it() {
    let (app, state) = harness().await;
    let id = oj_core::SessionId::new();
    state
        .store
        .create_session(id.clone(), chrono::Utc::now(), None, None, None, ExecutionMode::AsyncPoll)
        .await
        .expect("create");

    let request = HttpRequest::post(format!("/sessions/{id}/events"))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "event_type": "message", "payload": { "role": "user", "content": "hi" } })).expect("body"),
        ))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let events = state.store.list_events(&id).await.expect("list");
    assert_eq!(events.len(), 1);
}
