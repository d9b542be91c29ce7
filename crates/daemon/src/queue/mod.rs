// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run Queue (C3): the central matching engine between enqueued runs and
//! polling workers.
//!
//! The matching core is a short synchronous critical section guarded by a
//! `parking_lot::Mutex`, paired with a `tokio::sync::Notify` that long-poll
//! callers `.await` with a timeout — this keeps hundreds of concurrent Axum
//! handlers suspending cheaply without holding the mutex across an `.await`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use oj_core::{CoordinatorError, Run, RunId, RunStatus, SessionId, WorkerId};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::registry::WorkerRegistry;
use crate::stop::StopQueue;

/// Outcome of a worker's attempt to claim work.
#[derive(Debug)]
pub enum PollOutcome {
    Run(Run),
    StopCommands(Vec<RunId>),
    Deregistered,
    NoWork,
}

struct QueueState {
    /// Non-terminal runs, oldest first. Matching scans front-to-back.
    runs: VecDeque<Run>,
}

pub struct RunQueue<C: oj_core::Clock> {
    state: Mutex<QueueState>,
    notify: Notify,
    registry: Arc<WorkerRegistry<C>>,
    stop_queue: Arc<StopQueue>,
    no_match_timeout: chrono::Duration,
}

impl<C: oj_core::Clock> RunQueue<C> {
    pub fn new(registry: Arc<WorkerRegistry<C>>, stop_queue: Arc<StopQueue>, no_match_timeout: chrono::Duration) -> Self {
        Self {
            state: Mutex::new(QueueState { runs: VecDeque::new() }),
            notify: Notify::new(),
            registry,
            stop_queue,
            no_match_timeout,
        }
    }

    /// Enqueue a run, assigning a `no_match_deadline` if it carries demands.
    pub fn enqueue(&self, mut run: Run) -> Run {
        run.status = RunStatus::Pending;
        {
            let mut state = self.state.lock();
            state.runs.push_back(run.clone());
        }
        self.notify.notify_waiters();
        run
    }

    /// Worker long-poll: checks stop-commands/deregistration first, then
    /// attempts an immediate match, then waits up to `timeout` for one.
    pub async fn poll(&self, worker_id: &WorkerId, timeout: Duration) -> Result<PollOutcome, CoordinatorError> {
        if self.registry.take_deregister_signal(worker_id) {
            return Ok(PollOutcome::Deregistered);
        }
        let stops = self.stop_queue.drain(worker_id);
        if !stops.is_empty() {
            return Ok(PollOutcome::StopCommands(stops));
        }

        if let Some(run) = self.try_match(worker_id)? {
            return Ok(PollOutcome::Run(run));
        }

        let notified = self.notify.notified();
        let _ = tokio::time::timeout(timeout, notified).await;

        if self.registry.take_deregister_signal(worker_id) {
            return Ok(PollOutcome::Deregistered);
        }
        let stops = self.stop_queue.drain(worker_id);
        if !stops.is_empty() {
            return Ok(PollOutcome::StopCommands(stops));
        }
        match self.try_match(worker_id)? {
            Some(run) => Ok(PollOutcome::Run(run)),
            None => Ok(PollOutcome::NoWork),
        }
    }

    /// Check-then-claim under the queue mutex: the first pending run this
    /// worker satisfies is atomically claimed.
    fn try_match(&self, worker_id: &WorkerId) -> Result<Option<Run>, CoordinatorError> {
        if self.registry.get(worker_id).is_none() {
            return Err(CoordinatorError::not_found_worker(worker_id));
        }

        let mut state = self.state.lock();
        let position = state
            .runs
            .iter()
            .position(|run| run.status == RunStatus::Pending && self.registry.worker_satisfies(worker_id, &run.demands));

        let Some(index) = position else { return Ok(None) };
        let run = &mut state.runs[index];
        run.status = RunStatus::Claimed;
        run.claimed_by = Some(worker_id.clone());
        run.claimed_at = Some(Utc::now());
        Ok(Some(run.clone()))
    }

    pub fn report_started(&self, worker_id: &WorkerId, run_id: &RunId) -> Result<(), CoordinatorError> {
        self.transition_owned(worker_id, run_id, |run| {
            run.status = RunStatus::Running;
            Ok(())
        })
    }

    pub fn report_completed(&self, worker_id: &WorkerId, run_id: &RunId, result: Option<serde_json::Value>) -> Result<Run, CoordinatorError> {
        let run = self.transition_owned(worker_id, run_id, |run| {
            run.status = RunStatus::Completed;
            run.result = result;
            Ok(())
        })?;
        Ok(run)
    }

    pub fn report_failed(&self, worker_id: &WorkerId, run_id: &RunId, error: String) -> Result<Run, CoordinatorError> {
        self.transition_owned(worker_id, run_id, |run| {
            run.status = RunStatus::Failed;
            run.error = Some(error);
            Ok(())
        })
    }

    pub fn report_stopped(&self, worker_id: &WorkerId, run_id: &RunId) -> Result<Run, CoordinatorError> {
        self.transition_owned(worker_id, run_id, |run| {
            run.status = RunStatus::Stopped;
            Ok(())
        })
    }

    /// `pending` runs stop immediately (never claimed); `claimed|running`
    /// runs move to `stopping` and get a stop-command pushed to the owning
    /// worker's mailbox.
    pub fn request_stop(&self, run_id: &RunId) -> Result<Run, CoordinatorError> {
        let mut state = self.state.lock();
        let run = state
            .runs
            .iter_mut()
            .find(|r| &r.run_id == run_id)
            .ok_or_else(|| CoordinatorError::not_found_run(run_id))?;

        match run.status {
            RunStatus::Pending => {
                run.status = RunStatus::Stopped;
                let result = run.clone();
                drop(state);
                self.notify.notify_waiters();
                Ok(result)
            }
            RunStatus::Claimed | RunStatus::Running => {
                run.status = RunStatus::Stopping;
                let worker_id = run.claimed_by.clone();
                let result = run.clone();
                drop(state);
                if let Some(worker_id) = worker_id {
                    self.stop_queue.push_stop(&worker_id, run_id.clone());
                }
                self.notify.notify_waiters();
                Ok(result)
            }
            _ => Err(CoordinatorError::BadState(format!(
                "run {run_id} cannot be stopped from status {}",
                run.status
            ))),
        }
    }

    fn transition_owned(
        &self,
        worker_id: &WorkerId,
        run_id: &RunId,
        mutate: impl FnOnce(&mut Run) -> Result<(), CoordinatorError>,
    ) -> Result<Run, CoordinatorError> {
        let mut state = self.state.lock();
        let run = state
            .runs
            .iter_mut()
            .find(|r| &r.run_id == run_id)
            .ok_or_else(|| CoordinatorError::not_found_run(run_id))?;

        if run.claimed_by.as_ref() != Some(worker_id) {
            return Err(CoordinatorError::Forbidden { worker_id: worker_id.clone(), run_id: run_id.clone() });
        }

        mutate(run)?;
        Ok(run.clone())
    }

    pub fn get(&self, run_id: &RunId) -> Option<Run> {
        self.state.lock().runs.iter().find(|r| &r.run_id == run_id).cloned()
    }

    /// The session's single non-terminal run, if it has one — used by the
    /// Client API's stop endpoint, which addresses runs by session id.
    pub fn find_run_for_session(&self, session_id: &SessionId) -> Option<Run> {
        self.state.lock().runs.iter().find(|r| &r.session_id == session_id && !r.status.is_terminal()).cloned()
    }

    /// Runs still `pending` whose `no_match_deadline` has passed, for the
    /// reaper's no-match sweep. Does not mutate state; the caller decides
    /// how to fail them (so it can trigger callbacks outside this lock).
    pub fn sweep_no_match(&self) -> Vec<Run> {
        let now = Utc::now();
        let mut state = self.state.lock();
        let mut expired = Vec::new();
        for run in state.runs.iter_mut() {
            if run.status != RunStatus::Pending {
                continue;
            }
            if !run.demands.is_empty() {
                let deadline = run.created_at + self.no_match_timeout;
                if now >= deadline {
                    run.status = RunStatus::Failed;
                    run.error = Some("NoEligibleWorker".to_string());
                    expired.push(run.clone());
                }
            }
        }
        expired
    }

    /// Runs owned by `worker_id` that are still active, for the reaper's
    /// worker-removal sweep. Fails them in place and returns the failed runs.
    pub fn fail_runs_owned_by(&self, worker_id: &WorkerId) -> Vec<Run> {
        let mut state = self.state.lock();
        let mut failed = Vec::new();
        for run in state.runs.iter_mut() {
            if run.status.is_active() && run.claimed_by.as_ref() == Some(worker_id) {
                run.status = RunStatus::Failed;
                run.error = Some("WorkerLost".to_string());
                failed.push(run.clone());
            }
        }
        failed
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
