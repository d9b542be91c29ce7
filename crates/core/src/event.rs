// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events: the append-only record of everything that happens within a session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::SessionId;

/// The kind of an event appended to a session's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SessionStart,
    Message,
    ToolUse,
    ToolResult,
    SessionStop,
    Error,
}

crate::simple_display! {
    EventType {
        SessionStart => "session_start",
        Message => "message",
        ToolUse => "tool_use",
        ToolResult => "tool_result",
        SessionStop => "session_stop",
        Error => "error",
    }
}

impl EventType {
    /// Whether an event of this type closes out a run and may carry a
    /// terminal result/error for the callback processor to consume.
    pub fn is_session_stop(self) -> bool {
        matches!(self, Self::SessionStop)
    }
}

/// One entry in a session's append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub session_id: SessionId,
    pub sequence: u64,
    pub event_type: EventType,
    pub payload: Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The subset of a `session_stop` event's payload the callback processor
/// cares about: did the run succeed, and if not, why.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SessionStopPayload {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Event {
    /// Parse this event's payload as a `session_stop` payload, if it is one.
    ///
    /// Returns `None` for any other event type or if the payload doesn't
    /// match the expected shape.
    pub fn as_session_stop(&self) -> Option<SessionStopPayload> {
        if !self.event_type.is_session_stop() {
            return None;
        }
        serde_json::from_value(self.payload.clone()).ok()
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct EventBuilder => Event {
        set { session_id: SessionId = SessionId::new() }
        set { sequence: u64 = 0 }
        set { event_type: EventType = EventType::Message }
        set { payload: Value = Value::Null }
        set { created_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now() }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
