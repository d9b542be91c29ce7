// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client API (§6.1): the surface UIs, MCP tool servers, and the `ojc` CLI
//! use to start/resume sessions and read back their status and results.

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use oj_core::{Clock, CoordinatorError, DemandResolutionInputs, Run, RunnerDemands, RunType, SessionId, SessionStatus};

use crate::protocol::{
    DeleteResponse, EnqueueRunRequest, EnqueueRunResponse, SessionEventsResponse, SessionListResponse,
    SessionResponse, SessionResultResponse, SessionStatusResponse, StopResponse, UpdateMetadataRequest,
};
use crate::server::error::ApiError;
use crate::state::AppState;

/// Bearer auth (§6.5) is applied once, to the whole merged router, by
/// `server::mod`; it exempts `GET` so these read-only routes stay open even
/// when `AUTH_ENABLED` is set (§4.6).
pub fn router<C: Clock + 'static>() -> Router<AppState<C>> {
    Router::new()
        .route("/runs", post(enqueue_run))
        .route("/runs/:run_id", get(get_run))
        .route("/sessions", get(list_sessions))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/status", get(get_status))
        .route("/sessions/:id/result", get(get_result))
        .route("/sessions/:id/events", get(get_events))
        .route("/sessions/:id/stop", post(stop_session))
        .route("/sessions/:id/metadata", patch(update_metadata))
}

async fn enqueue_run<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Json(request): Json<EnqueueRunRequest>,
) -> Result<Json<EnqueueRunResponse>, ApiError> {
    let now = Utc::now();
    let prompt = request.resolved_prompt();

    let session_id = match request.run_type {
        RunType::StartSession => {
            let session_id = request.session_id.clone().unwrap_or_else(SessionId::new);
            state
                .store
                .create_session(
                    session_id.clone(),
                    now,
                    request.parent_session_id.clone(),
                    request.project_dir.clone(),
                    request.agent_name.clone(),
                    request.execution_mode.unwrap_or_default(),
                )
                .await?;
            session_id
        }
        RunType::ResumeSession => request
            .session_id
            .clone()
            .ok_or_else(|| CoordinatorError::Validation("resume_session requires session_id".to_string()))?,
    };

    let worker_owned = request
        .agent_name
        .as_deref()
        .and_then(|name| state.registry.owner_of_agent(name))
        .and_then(|worker_id| state.registry.get(&worker_id))
        .map(|worker| worker.as_demands());

    let session_affinity = if request.run_type == RunType::ResumeSession {
        let affinity = state.store.get_affinity(&session_id).await?;
        if affinity.hostname.is_some() || affinity.executor_profile.is_some() {
            Some(RunnerDemands {
                hostname: affinity.hostname,
                project_dir: None,
                executor_profile: affinity.executor_profile,
                executor_type: None,
                tags: Default::default(),
            })
        } else {
            None
        }
    } else {
        None
    };

    let executor_type = request.blueprint_demands.as_ref().and_then(|d| d.executor_type).unwrap_or_default();

    let demands = oj_core::resolve_demands(DemandResolutionInputs {
        worker_owned,
        session_affinity,
        blueprint: request.blueprint_demands.clone(),
        script: request.script_demands.clone(),
        executor_type,
        additional: request.additional_demands.clone(),
    });

    let run = match request.run_type {
        RunType::StartSession => Run::new_start(session_id.clone(), demands, now),
        RunType::ResumeSession => {
            let prompt = prompt.unwrap_or_default();
            Run::new_resume(session_id.clone(), demands, prompt, now)
        }
    };

    let run = state.queue.enqueue(run);

    Ok(Json(EnqueueRunResponse { run_id: run.run_id, session_id, status: run.status }))
}

async fn get_run<C: Clock + 'static>(State(state): State<AppState<C>>, Path(run_id): Path<oj_core::RunId>) -> Result<Json<Run>, ApiError> {
    state.queue.get(&run_id).map(Json).ok_or_else(|| ApiError(CoordinatorError::not_found_run(&run_id)))
}

async fn list_sessions<C: Clock + 'static>(State(state): State<AppState<C>>) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.store.list_sessions().await?;
    Ok(Json(SessionListResponse { sessions }))
}

async fn get_session<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.store.get_session(&id).await?;
    Ok(Json(SessionResponse { session }))
}

async fn get_status<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let session = state.store.get_session(&id).await?;
    Ok(Json(SessionStatusResponse { status: session.status }))
}

async fn get_result<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionResultResponse>, ApiError> {
    let session = state.store.get_session(&id).await?;
    if session.status != SessionStatus::Finished {
        return Err(ApiError(CoordinatorError::BadState(format!(
            "session {id} has not finished (status: {})",
            session.status
        ))));
    }
    let result = state.store.get_result(&id).await?;
    Ok(Json(SessionResultResponse { result }))
}

async fn get_events<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionEventsResponse>, ApiError> {
    let events = state.store.list_events(&id).await?;
    Ok(Json(SessionEventsResponse { events }))
}

async fn stop_session<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<SessionId>,
) -> Result<Json<StopResponse>, ApiError> {
    // A session may have accumulated several terminal runs but at most one
    // non-terminal run; find it by scanning the queue for this session.
    let run = find_active_run(&state, &id).ok_or_else(|| ApiError(CoordinatorError::BadState(format!("session {id} has no active run to stop"))))?;
    let run = state.queue.request_stop(&run.run_id)?;

    let session_status = match run.status {
        oj_core::RunStatus::Stopped => SessionStatus::Stopped,
        _ => SessionStatus::Stopping,
    };
    let session = state.store.set_status(&id, session_status).await?;

    if session.status.is_terminal() {
        state.orchestrator.finish_session(&id, session.status, None, None).await?;
    }

    Ok(Json(StopResponse { ok: true, status: run.status }))
}

fn find_active_run<C: Clock + 'static>(state: &AppState<C>, session_id: &SessionId) -> Option<Run> {
    // The Run Queue doesn't index by session_id (§4.3 is a FIFO list), so a
    // linear scan over `GET /runs/{id}` candidates isn't available; instead
    // we rely on the queue's own lookup surface via `find_run_for_session`.
    state.queue.find_run_for_session(session_id)
}

async fn delete_session<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<SessionId>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.store.delete_session(&id).await?;
    Ok(Json(DeleteResponse { ok: true, deleted: id }))
}

async fn update_metadata<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<SessionId>,
    Json(request): Json<UpdateMetadataRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.store.update_metadata(&id, request.project_dir, request.agent_name, request.last_resumed_at).await?;
    Ok(Json(SessionResponse { session }))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
