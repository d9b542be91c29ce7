// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run: one dispatch of work — a start or a resume — onto a worker.
//!
//! A session may accumulate many runs over its lifetime (an initial start,
//! then zero or more resumes triggered by callbacks or operator action). The
//! run is the unit the run queue matches against workers and the unit the
//! stop-command queue targets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::demand::RunnerDemands;
use crate::ids::{RunId, SessionId, WorkerId};

/// Whether a run starts a fresh session or resumes an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    StartSession,
    ResumeSession,
}

crate::simple_display! {
    RunType {
        StartSession => "start_session",
        ResumeSession => "resume_session",
    }
}

/// A run's position in its own lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Claimed,
    Running,
    Completed,
    Failed,
    Stopping,
    Stopped,
}

crate::simple_display! {
    RunStatus {
        Pending => "pending",
        Claimed => "claimed",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Stopping => "stopping",
        Stopped => "stopped",
    }
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }

    /// Whether a worker currently owns this run and could be asked to stop it.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Claimed | Self::Running | Self::Stopping)
    }
}

/// An enqueued or in-flight unit of work for a worker to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: RunId,
    pub session_id: SessionId,
    pub run_type: RunType,
    pub status: RunStatus,
    pub demands: RunnerDemands,
    pub prompt: Option<String>,
    pub claimed_by: Option<WorkerId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub claimed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl Run {
    pub fn new_start(session_id: SessionId, demands: RunnerDemands, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            run_id: RunId::new(),
            session_id,
            run_type: RunType::StartSession,
            status: RunStatus::Pending,
            demands,
            prompt: None,
            claimed_by: None,
            created_at: now,
            claimed_at: None,
            result: None,
            error: None,
        }
    }

    pub fn new_resume(
        session_id: SessionId,
        demands: RunnerDemands,
        prompt: String,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            run_id: RunId::new(),
            session_id,
            run_type: RunType::ResumeSession,
            status: RunStatus::Pending,
            demands,
            prompt: Some(prompt),
            claimed_by: None,
            created_at: now,
            claimed_at: None,
            result: None,
            error: None,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct RunBuilder => Run {
        set { run_id: RunId = RunId::new() }
        set { session_id: SessionId = SessionId::new() }
        set { run_type: RunType = RunType::StartSession }
        set { status: RunStatus = RunStatus::Pending }
        set { demands: RunnerDemands = RunnerDemands::default() }
        option { prompt: String = None }
        option { claimed_by: WorkerId = None }
        set { created_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now() }
        option { claimed_at: chrono::DateTime<chrono::Utc> = None }
        option { result: Value = None }
        option { error: String = None }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
