// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use futures_util::{SinkExt, StreamExt};
use oj_core::{ExecutionMode, FakeClock};
use tokio_tungstenite::tungstenite::Message as WsMessage;

async fn spawn_server() -> (std::net::SocketAddr, AppState<FakeClock>) {
    let pool = oj_storage::connect(":memory:").await.expect("connect");
    let store = std::sync::Arc::new(oj_storage::SessionStore::new(pool));
    let config = crate::config::Config {
        listen_addr: "127.0.0.1:0".to_string(),
        db_path: ":memory:".to_string(),
        long_poll: std::time::Duration::from_secs(1),
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
    let app = Router::new().merge(router::<FakeClock>()).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, state)
}

#[tokio::test]
async fn connect_receives_init_with_current_sessions() {
    let (addr, state) = spawn_server().await;
    let id = oj_core::SessionId::new();
    state
        .store
        .create_session(id.clone(), chrono::Utc::now(), None, None, None, ExecutionMode::AsyncPoll)
        .await
        .expect("create");

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await.expect("connect");
    let message = ws.next().await.expect("stream open").expect("frame");
    let WsMessage::Text(text) = message else { panic!("expected text frame") };
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["type"], "init");
    assert_eq!(value["sessions"][0]["session_id"], id.as_str());
}

#[tokio::test]
async fn session_update_is_pushed_to_connected_clients() {
    let (addr, state) = spawn_server().await;
    let id = oj_core::SessionId::new();
    state
        .store
        .create_session(id.clone(), chrono::Utc::now(), None, None, None, ExecutionMode::AsyncPoll)
        .await
        .expect("create");

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await.expect("connect");
    let _init = ws.next().await.expect("stream open").expect("frame");

    state.store.set_status(&id, oj_core::SessionStatus::Failed).await.expect("set_status");

    let message = ws.next().await.expect("stream open").expect("frame");
    let WsMessage::Text(text) = message else { panic!("expected text frame") };
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["type"], "session_updated");
    assert_eq!(value["session"]["session_id"], id.as_str());

    ws.close(None).await.ok();
}
