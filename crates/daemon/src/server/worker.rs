// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker API (§6.2): the surface remote worker processes use to register,
//! long-poll for runs, report outcomes, and feed events back into a
//! session's transcript.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use oj_core::{Clock, CoordinatorError, RunId, SessionId, SessionStatus};

use crate::protocol::{
    AppendEventRequest, BindRequest, CompletedRequest, DeregisterQuery, FailedRequest, PollResponse,
    RegisterWorkerRequest, RegisterWorkerResponse, StoppedRequest, WorkerActionRequest, WorkerIdQuery,
};
use crate::queue::PollOutcome;
use crate::registry::RegisterRequest;
use crate::server::error::ApiError;
use crate::state::AppState;

pub fn router<C: Clock + 'static>() -> Router<AppState<C>> {
    Router::new()
        .route("/worker/register", post(register))
        .route("/worker/runs", get(poll_runs))
        .route("/worker/runs/:run_id/started", post(report_started))
        .route("/worker/runs/:run_id/completed", post(report_completed))
        .route("/worker/runs/:run_id/failed", post(report_failed))
        .route("/worker/runs/:run_id/stopped", post(report_stopped))
        .route("/worker/heartbeat", post(heartbeat))
        .route("/sessions/:id/bind", post(bind_session))
        .route("/sessions/:id/events", post(append_event))
        .route("/workers/:id", delete(deregister))
}

async fn register<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Json(request): Json<RegisterWorkerRequest>,
) -> Result<Json<RegisterWorkerResponse>, ApiError> {
    let worker = state.registry.register(RegisterRequest {
        hostname: request.hostname,
        project_dir: request.project_dir,
        executor_profile: request.executor_profile,
        tags: request.tags,
        require_matching_tags: request.require_matching_tags,
        owned_agents: request.agents,
    })?;

    Ok(Json(RegisterWorkerResponse {
        worker_id: worker.worker_id,
        poll_endpoint: "/worker/runs".to_string(),
        poll_timeout_seconds: state.config.long_poll.as_secs(),
        heartbeat_interval_seconds: state.config.heartbeat_timeout.num_seconds().max(1) as u64 / 2,
    }))
}

/// Long-poll: 204 on timeout, 200 with a tagged body otherwise (§6.2).
async fn poll_runs<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Query(query): Query<WorkerIdQuery>,
) -> Result<Response, ApiError> {
    let outcome = state.queue.poll(&query.worker_id, state.config.long_poll).await?;
    Ok(match outcome {
        PollOutcome::Run(run) => Json(PollResponse::Run { run }).into_response(),
        PollOutcome::StopCommands(stop_runs) => Json(PollResponse::StopRuns { stop_runs }).into_response(),
        PollOutcome::Deregistered => Json(PollResponse::Deregistered { deregistered: true }).into_response(),
        PollOutcome::NoWork => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn report_started<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(run_id): Path<RunId>,
    Json(request): Json<WorkerActionRequest>,
) -> Result<StatusCode, ApiError> {
    state.queue.report_started(&request.worker_id, &run_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn report_completed<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(run_id): Path<RunId>,
    Json(request): Json<CompletedRequest>,
) -> Result<StatusCode, ApiError> {
    let run = state.queue.report_completed(&request.worker_id, &run_id, request.result.clone())?;
    let result = request.result.as_ref().and_then(|v| v.get("text")).and_then(|v| v.as_str()).map(str::to_string);
    state.orchestrator.finish_session(&run.session_id, SessionStatus::Finished, result, None).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn report_failed<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(run_id): Path<RunId>,
    Json(request): Json<FailedRequest>,
) -> Result<StatusCode, ApiError> {
    let run = state.queue.report_failed(&request.worker_id, &run_id, request.error.clone())?;
    state.orchestrator.finish_session(&run.session_id, SessionStatus::Failed, None, Some(request.error)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn report_stopped<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(run_id): Path<RunId>,
    Json(request): Json<StoppedRequest>,
) -> Result<StatusCode, ApiError> {
    let run = state.queue.report_stopped(&request.worker_id, &run_id)?;
    state.orchestrator.finish_session(&run.session_id, SessionStatus::Stopped, None, None).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn heartbeat<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Json(request): Json<WorkerActionRequest>,
) -> Result<StatusCode, ApiError> {
    state.registry.heartbeat(&request.worker_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bind_session<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<SessionId>,
    Json(request): Json<BindRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .bind_executor(&id, &request.executor_session_id, &request.hostname, &request.executor_profile, request.project_dir)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn append_event<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<SessionId>,
    Json(request): Json<AppendEventRequest>,
) -> Result<StatusCode, ApiError> {
    state.store.append_event_auto(&id, request.event_type, request.payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn deregister<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<oj_core::WorkerId>,
    Query(query): Query<DeregisterQuery>,
) -> Result<StatusCode, ApiError> {
    if !query.self_ {
        return Err(ApiError(CoordinatorError::Validation("DELETE /workers/{id} requires ?self=true".to_string())));
    }
    state.registry.mark_deregistered(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
