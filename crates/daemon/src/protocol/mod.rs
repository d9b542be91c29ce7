// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire DTOs for the Client, Worker, and Realtime APIs.
//!
//! These are intentionally separate from the `oj-core` domain types: the
//! wire shape (snake_case JSON, optional fields, nested `{sessions: […]}`
//! envelopes) is an HTTP-layer concern, not a domain one.

use std::collections::BTreeSet;

use oj_core::{Event, Run, RunStatus, RunType, RunnerDemands, Session, SessionId, WorkerId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EnqueueRunRequest {
    #[serde(rename = "type")]
    pub run_type: RunType,
    pub session_id: Option<SessionId>,
    pub agent_name: Option<String>,
    pub project_dir: Option<String>,
    pub parent_session_id: Option<SessionId>,
    pub execution_mode: Option<oj_core::ExecutionMode>,
    /// Either `parameters.prompt` or a top-level `prompt` is accepted; the
    /// Coordinator only cares about the prompt text, not the rest of the
    /// opaque `parameters` bag.
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub parameters: Option<Value>,
    #[serde(default)]
    pub additional_demands: Option<RunnerDemands>,
    #[serde(default)]
    pub blueprint_demands: Option<RunnerDemands>,
    #[serde(default)]
    pub script_demands: Option<RunnerDemands>,
}

impl EnqueueRunRequest {
    pub fn resolved_prompt(&self) -> Option<String> {
        self.prompt.clone().or_else(|| {
            self.parameters
                .as_ref()
                .and_then(|params| params.get("prompt"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnqueueRunResponse {
    pub run_id: oj_core::RunId,
    pub session_id: SessionId,
    pub status: RunStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    #[serde(flatten)]
    pub run: Run,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: Session,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusResponse {
    pub status: oj_core::SessionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResultResponse {
    pub result: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEventsResponse {
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopResponse {
    pub ok: bool,
    pub status: RunStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
    pub deleted: SessionId,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateMetadataRequest {
    pub project_dir: Option<String>,
    pub agent_name: Option<String>,
    pub last_resumed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterWorkerRequest {
    pub hostname: String,
    pub project_dir: String,
    pub executor_profile: String,
    /// Accepted for wire compatibility with the original's `executor` field;
    /// not otherwise interpreted (executor dispatch is the worker's job).
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub require_matching_tags: bool,
    #[serde(default)]
    pub agents: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterWorkerResponse {
    pub worker_id: WorkerId,
    pub poll_endpoint: String,
    pub poll_timeout_seconds: u64,
    pub heartbeat_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerIdQuery {
    pub worker_id: WorkerId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PollResponse {
    Run { run: Run },
    StopRuns { stop_runs: Vec<oj_core::RunId> },
    Deregistered { deregistered: bool },
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerActionRequest {
    pub worker_id: WorkerId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletedRequest {
    pub worker_id: WorkerId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailedRequest {
    pub worker_id: WorkerId,
    pub error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoppedRequest {
    pub worker_id: WorkerId,
    #[serde(default)]
    pub signal: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BindRequest {
    pub executor_session_id: String,
    pub hostname: String,
    pub executor_profile: String,
    #[serde(default)]
    pub project_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppendEventRequest {
    pub event_type: oj_core::EventType,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeregisterQuery {
    #[serde(rename = "self", default)]
    pub self_: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeMessage {
    Init { sessions: Vec<Session> },
    Event { data: Event },
    SessionCreated { session: Session },
    SessionUpdated { session: Session },
    SessionDeleted { session_id: SessionId },
}
