// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime API (§6.3): a `GET /ws` WebSocket stream of session lifecycle
//! and event notifications, fed by the Session Store's broadcast channel.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use oj_core::Clock;
use oj_storage::ChangeNotification;
use tracing::warn;

use crate::protocol::RealtimeMessage;
use crate::state::AppState;

/// Backlog a client is allowed to fall behind by before it's disconnected
/// (§4.6: "slow clients are dropped after a bounded backlog"). A lagged
/// `broadcast::Receiver` already reports how many messages it missed; we
/// treat any lag past this threshold as terminal rather than trying to
/// resynchronize.
const MAX_LAG: u64 = 256;

pub fn router<C: Clock + 'static>() -> Router<AppState<C>> {
    Router::new().route("/ws", get(upgrade))
}

async fn upgrade<C: Clock + 'static>(ws: WebSocketUpgrade, State(state): State<AppState<C>>) -> Response {
    ws.on_upgrade(move |socket| serve(socket, state))
}

async fn serve<C: Clock + 'static>(mut socket: WebSocket, state: AppState<C>) {
    let mut changes = state.store.subscribe();

    let sessions = match state.store.list_sessions().await {
        Ok(sessions) => sessions,
        Err(err) => {
            warn!(%err, "realtime: failed to build initial session snapshot");
            return;
        }
    };
    if send(&mut socket, &RealtimeMessage::Init { sessions }).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            change = changes.recv() => {
                match change {
                    Ok(change) => {
                        let message = translate(change);
                        if send(&mut socket, &message).await.is_err() {
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) if missed <= MAX_LAG => {
                        warn!(missed, "realtime: client lagging, continuing");
                        continue;
                    }
                    Err(_) => {
                        let _ = socket.send(Message::Close(None)).await;
                        return;
                    }
                }
            }
            incoming = socket.recv() => {
                // The protocol is server-push only; any client frame (including
                // pings the browser answers automatically) just keeps the
                // connection alive. A `None`/close frame ends the loop.
                if incoming.is_none() {
                    return;
                }
            }
        }
    }
}

fn translate(change: ChangeNotification) -> RealtimeMessage {
    match change {
        ChangeNotification::SessionCreated(session) => RealtimeMessage::SessionCreated { session },
        ChangeNotification::SessionUpdated(session) => RealtimeMessage::SessionUpdated { session },
        ChangeNotification::SessionDeleted(session_id) => RealtimeMessage::SessionDeleted { session_id },
        ChangeNotification::EventAppended(event) => RealtimeMessage::Event { data: event },
    }
}

async fn send(socket: &mut WebSocket, message: &RealtimeMessage) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(text)).await
}

#[cfg(test)]
#[path = "realtime_tests.rs"]
mod tests;
