// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn not_found_helpers_set_kind_and_id() {
    let session_id = SessionId::new();
    let err = CoordinatorError::not_found_session(&session_id);
    assert_eq!(err.code(), "not_found");
    assert!(err.to_string().contains("session"));
    assert!(err.to_string().contains(&session_id.to_string()));
}

#[test]
fn codes_are_stable_tags() {
    let run_id = RunId::new();
    let worker_id = WorkerId::derive("h", "p", "e");

    assert_eq!(CoordinatorError::Validation("x".into()).code(), "validation");
    assert_eq!(CoordinatorError::Conflict("x".into()).code(), "conflict");
    assert_eq!(CoordinatorError::BadState("x".into()).code(), "bad_state");
    assert_eq!(
        CoordinatorError::Forbidden { worker_id: worker_id.clone(), run_id: run_id.clone() }.code(),
        "forbidden"
    );
    assert_eq!(
        CoordinatorError::NoEligibleWorker { run_id: run_id.clone() }.code(),
        "no_eligible_worker"
    );
    assert_eq!(
        CoordinatorError::WorkerLost { worker_id, run_id }.code(),
        "worker_lost"
    );
}

#[test]
fn internal_wraps_anyhow() {
    let source = anyhow::anyhow!("disk full");
    let err: CoordinatorError = source.into();
    assert_eq!(err.code(), "internal");
    assert!(err.to_string().contains("disk full"));
}
