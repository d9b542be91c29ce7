// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires a session's terminal transition to the Callback Processor and the
//! Demand Resolver: the one place that knows how to turn "a run just ended"
//! into "update the session row, notify the parent, maybe enqueue a resume".
//!
//! Both the Worker API's `report_completed/failed/stopped` handlers and the
//! Lifecycle Reaper's `WorkerLost`/`NoEligibleWorker` sweeps end a run here
//! rather than duplicating the callback/resume wiring.

use std::sync::Arc;

use chrono::Utc;
use oj_core::{
    Clock, CoordinatorError, DemandResolutionInputs, RunnerDemands, Session, SessionId, SessionStatus,
};
use oj_storage::SessionStore;

use crate::callback::{build_aggregated_prompt, build_single_prompt, AggregatedDelivery, CallbackProcessor, ChildOutcome, DeliveryDecision};
use crate::queue::RunQueue;

pub struct SessionOrchestrator<C: Clock> {
    store: Arc<SessionStore>,
    queue: Arc<RunQueue<C>>,
    callback: Arc<CallbackProcessor>,
}

impl<C: Clock> SessionOrchestrator<C> {
    pub fn new(store: Arc<SessionStore>, queue: Arc<RunQueue<C>>, callback: Arc<CallbackProcessor>) -> Self {
        Self { store, queue, callback }
    }

    /// A session reached a terminal state. Updates its row, then:
    /// notifies its parent (if any) of this outcome, and flushes any
    /// outcomes that queued up while this session itself was busy acting as
    /// a parent.
    pub async fn finish_session(
        &self,
        session_id: &SessionId,
        status: SessionStatus,
        result: Option<String>,
        error: Option<String>,
    ) -> Result<Session, CoordinatorError> {
        debug_assert!(status.is_terminal(), "finish_session called with a non-terminal status");

        let session = self.store.set_status(session_id, status).await?;

        if let Some(parent_id) = session.parent_session_id.clone() {
            let parent_finished = match self.store.get_session(&parent_id).await {
                Ok(parent) => parent.status.is_terminal(),
                Err(_) => false,
            };
            let outcome = ChildOutcome {
                child_id: session_id.clone(),
                result,
                failed: status == SessionStatus::Failed,
                error,
            };
            self.deliver_child_outcome(parent_id, parent_finished, outcome).await?;
        }

        self.flush_own_pending(session_id).await?;
        Ok(session)
    }

    async fn deliver_child_outcome(
        &self,
        parent_id: SessionId,
        parent_finished: bool,
        outcome: ChildOutcome,
    ) -> Result<(), CoordinatorError> {
        match self.callback.on_child_completed(outcome.child_id.clone(), parent_id, parent_finished, outcome) {
            DeliveryDecision::DeliverNow { parent_id, outcome } => {
                let prompt = build_single_prompt(&outcome);
                self.enqueue_resume(parent_id, prompt).await
            }
            DeliveryDecision::Queued | DeliveryDecision::Dropped => Ok(()),
        }
    }

    async fn flush_own_pending(&self, session_id: &SessionId) -> Result<(), CoordinatorError> {
        match self.callback.on_session_stopped(session_id) {
            AggregatedDelivery::DeliverNow { parent_id, outcomes } => {
                let prompt = build_aggregated_prompt(&outcomes);
                self.enqueue_resume(parent_id, prompt).await
            }
            AggregatedDelivery::Nothing => Ok(()),
        }
    }

    async fn enqueue_resume(&self, parent_id: SessionId, prompt: String) -> Result<(), CoordinatorError> {
        let affinity = self.store.get_affinity(&parent_id).await?;
        let session_affinity = if affinity.hostname.is_some() || affinity.executor_profile.is_some() {
            Some(RunnerDemands {
                hostname: affinity.hostname,
                project_dir: None,
                executor_profile: affinity.executor_profile,
                executor_type: None,
                tags: Default::default(),
            })
        } else {
            None
        };

        let demands = oj_core::resolve_demands(DemandResolutionInputs {
            session_affinity,
            ..Default::default()
        });

        let run = oj_core::Run::new_resume(parent_id, demands, prompt, Utc::now());
        self.queue.enqueue(run);
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
