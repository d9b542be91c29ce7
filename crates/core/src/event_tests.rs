// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn event_type_display() {
    assert_eq!(EventType::SessionStop.to_string(), "session_stop");
    assert_eq!(EventType::ToolUse.to_string(), "tool_use");
}

#[test]
fn only_session_stop_is_terminal() {
    assert!(EventType::SessionStop.is_session_stop());
    assert!(!EventType::Message.is_session_stop());
    assert!(!EventType::Error.is_session_stop());
}

#[test]
fn parses_successful_session_stop_payload() {
    let event = Event::builder()
        .event_type(EventType::SessionStop)
        .payload(json!({ "success": true, "result": { "answer": 42 } }))
        .build();

    let stop = event.as_session_stop().expect("session_stop payload");
    assert!(stop.success);
    assert_eq!(stop.result, Some(json!({ "answer": 42 })));
    assert_eq!(stop.error, None);
}

#[test]
fn parses_failed_session_stop_payload() {
    let event = Event::builder()
        .event_type(EventType::SessionStop)
        .payload(json!({ "success": false, "error": "timed out" }))
        .build();

    let stop = event.as_session_stop().expect("session_stop payload");
    assert!(!stop.success);
    assert_eq!(stop.error.as_deref(), Some("timed out"));
}

#[test]
fn non_stop_events_have_no_session_stop_payload() {
    let event = Event::builder()
        .event_type(EventType::Message)
        .payload(json!({ "success": true }))
        .build();

    assert!(event.as_session_stop().is_none());
}

#[test]
fn missing_fields_default_rather_than_error() {
    let event = Event::builder()
        .event_type(EventType::SessionStop)
        .payload(json!({}))
        .build();

    let stop = event.as_session_stop().expect("session_stop payload");
    assert!(!stop.success);
    assert_eq!(stop.result, None);
    assert_eq!(stop.error, None);
}
