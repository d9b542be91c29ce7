// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session: the durable record of one agent conversation.

use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// Coarse lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Running,
    Stopping,
    Stopped,
    Finished,
    Failed,
}

crate::simple_display! {
    SessionStatus {
        Pending => "pending",
        Running => "running",
        Stopping => "stopping",
        Stopped => "stopped",
        Finished => "finished",
        Failed => "failed",
    }
}

impl SessionStatus {
    /// A session in this state has no active run; it is safe to deliver a
    /// queued callback and to reassign its parent.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Finished | Self::Failed)
    }
}

/// How the caller expects to consume the run's eventual result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Sync,
    AsyncPoll,
    AsyncCallback,
}

crate::simple_display! {
    ExecutionMode {
        Sync => "sync",
        AsyncPoll => "async_poll",
        AsyncCallback => "async_callback",
    }
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::AsyncPoll
    }
}

/// A session's worker/executor affinity, used to route resumes back to the
/// same machine and to answer worker-side lookups by `executor_session_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affinity {
    pub hostname: Option<String>,
    pub project_dir: Option<String>,
    pub executor_profile: Option<String>,
    pub executor_session_id: Option<String>,
}

/// The durable session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_resumed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub project_dir: Option<String>,
    pub agent_name: Option<String>,
    pub parent_session_id: Option<SessionId>,
    pub execution_mode: ExecutionMode,
    pub hostname: Option<String>,
    pub executor_profile: Option<String>,
    pub executor_session_id: Option<String>,
}

impl Session {
    pub fn affinity(&self) -> Affinity {
        Affinity {
            hostname: self.hostname.clone(),
            project_dir: self.project_dir.clone(),
            executor_profile: self.executor_profile.clone(),
            executor_session_id: self.executor_session_id.clone(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct SessionBuilder => Session {
        set { session_id: SessionId = SessionId::new() }
        set { status: SessionStatus = SessionStatus::Pending }
        set { created_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now() }
        option { last_resumed_at: chrono::DateTime<chrono::Utc> = None }
        option { project_dir: String = None }
        option { agent_name: String = None }
        option { parent_session_id: SessionId = None }
        set { execution_mode: ExecutionMode = ExecutionMode::AsyncPoll }
        option { hostname: String = None }
        option { executor_profile: String = None }
        option { executor_session_id: String = None }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
