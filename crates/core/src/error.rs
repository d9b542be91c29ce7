// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator's unified error taxonomy.
//!
//! Every component-level error (registry, queue, store, ...) converts into
//! [`CoordinatorError`] via `From` rather than being matched ad hoc at each
//! call site. The HTTP status mapping lives in `oj-daemon`, which is the
//! only crate that depends on Axum.

use thiserror::Error;

use crate::ids::{RunId, SessionId, WorkerId};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Bad input shape or semantics (e.g. unknown run type).
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown session/run/worker.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Duplicate session id, worker-identity reconnection collision, or
    /// agent-name collision across workers.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation forbidden in the entity's current state (stopping a
    /// finished run, binding a terminal session).
    #[error("bad state: {0}")]
    BadState(String),

    /// A worker reported on a run it does not own.
    #[error("worker {worker_id} does not own run {run_id}")]
    Forbidden { worker_id: WorkerId, run_id: RunId },

    /// A run's demands never matched an eligible worker within the
    /// no-match timeout.
    #[error("no eligible worker matched run {run_id} within the timeout")]
    NoEligibleWorker { run_id: RunId },

    /// The worker owning a run was removed from the registry before the
    /// run reached a terminal state.
    #[error("worker {worker_id} was lost while owning run {run_id}")]
    WorkerLost { worker_id: WorkerId, run_id: RunId },

    /// Anything else: persistence failures, I/O, serialization.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CoordinatorError {
    pub fn not_found_session(id: &SessionId) -> Self {
        Self::NotFound { kind: "session", id: id.to_string() }
    }

    pub fn not_found_run(id: &RunId) -> Self {
        Self::NotFound { kind: "run", id: id.to_string() }
    }

    pub fn not_found_worker(id: &WorkerId) -> Self {
        Self::NotFound { kind: "worker", id: id.to_string() }
    }

    /// A short machine-readable tag for this error's category, used in wire
    /// responses alongside the human-readable `detail` message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::BadState(_) => "bad_state",
            Self::Forbidden { .. } => "forbidden",
            Self::NoEligibleWorker { .. } => "no_eligible_worker",
            Self::WorkerLost { .. } => "worker_lost",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
