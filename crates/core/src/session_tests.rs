// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn terminal_statuses() {
    assert!(SessionStatus::Stopped.is_terminal());
    assert!(SessionStatus::Finished.is_terminal());
    assert!(SessionStatus::Failed.is_terminal());
    assert!(!SessionStatus::Pending.is_terminal());
    assert!(!SessionStatus::Running.is_terminal());
    assert!(!SessionStatus::Stopping.is_terminal());
}

#[test]
fn status_display_matches_wire_form() {
    assert_eq!(SessionStatus::Running.to_string(), "running");
    assert_eq!(SessionStatus::Stopping.to_string(), "stopping");
}

#[test]
fn execution_mode_default_is_async_poll() {
    assert_eq!(ExecutionMode::default(), ExecutionMode::AsyncPoll);
}

#[test]
fn execution_mode_display() {
    assert_eq!(ExecutionMode::Sync.to_string(), "sync");
    assert_eq!(ExecutionMode::AsyncCallback.to_string(), "async_callback");
}

#[test]
fn affinity_reflects_session_fields() {
    let session = Session::builder()
        .hostname("host-1")
        .project_dir("/srv/proj")
        .executor_profile("default")
        .executor_session_id("exec-abc")
        .build();

    let affinity = session.affinity();
    assert_eq!(affinity.hostname.as_deref(), Some("host-1"));
    assert_eq!(affinity.project_dir.as_deref(), Some("/srv/proj"));
    assert_eq!(affinity.executor_profile.as_deref(), Some("default"));
    assert_eq!(affinity.executor_session_id.as_deref(), Some("exec-abc"));
}

#[test]
fn builder_defaults_to_pending() {
    let session = Session::builder().build();
    assert_eq!(session.status, SessionStatus::Pending);
    assert_eq!(session.execution_mode, ExecutionMode::AsyncPoll);
    assert!(session.parent_session_id.is_none());
}
