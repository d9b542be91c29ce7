// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle Reaper (C8): the one background task that ages out silent
//! workers and runs nobody ever claimed.
//!
//! Each tick sweeps the Worker Registry, fails any run the removed workers
//! still owned, sweeps the Run Queue for runs past their no-match deadline,
//! then hands every failure to the [`SessionOrchestrator`] so the usual
//! callback/resume wiring applies. No lock is held across an `.await`: each
//! sweep method takes and releases its own lock before the orchestrator ever
//! touches the session store.

use std::sync::Arc;
use std::time::Duration;

use oj_core::{Clock, SessionStatus};
use tracing::{info, warn};

use crate::orchestrator::SessionOrchestrator;
use crate::queue::RunQueue;
use crate::registry::WorkerRegistry;

pub struct ReaperConfig {
    pub tick_interval: Duration,
    pub stale_after: chrono::Duration,
    pub remove_after: chrono::Duration,
}

pub struct LifecycleReaper<C: Clock> {
    registry: Arc<WorkerRegistry<C>>,
    queue: Arc<RunQueue<C>>,
    orchestrator: Arc<SessionOrchestrator<C>>,
    config: ReaperConfig,
}

impl<C: Clock + 'static> LifecycleReaper<C> {
    pub fn new(
        registry: Arc<WorkerRegistry<C>>,
        queue: Arc<RunQueue<C>>,
        orchestrator: Arc<SessionOrchestrator<C>>,
        config: ReaperConfig,
    ) -> Self {
        Self { registry, queue, orchestrator, config }
    }

    /// Spawn the reaper's tick loop. The returned handle runs until aborted.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::task::spawn(async move {
            let mut interval = tokio::time::interval(self.config.tick_interval);
            loop {
                interval.tick().await;
                self.tick().await;
            }
        })
    }

    /// Run one sweep. Exposed directly so tests can drive it deterministically
    /// instead of waiting on a real interval.
    pub async fn tick(&self) {
        let removed_workers = self.registry.lifecycle_sweep(self.config.stale_after, self.config.remove_after);
        for worker_id in &removed_workers {
            warn!(%worker_id, "reaper: worker removed for missed heartbeats");
        }

        let mut failed_runs = Vec::new();
        for worker_id in &removed_workers {
            failed_runs.extend(self.queue.fail_runs_owned_by(worker_id));
        }
        failed_runs.extend(self.queue.sweep_no_match());

        for run in failed_runs {
            let error = run.error.clone().unwrap_or_default();
            info!(session_id = %run.session_id, run_id = %run.run_id, %error, "reaper: failing run");
            if let Err(err) = self
                .orchestrator
                .finish_session(&run.session_id, SessionStatus::Failed, None, Some(error))
                .await
            {
                warn!(session_id = %run.session_id, %err, "reaper: failed to finish session after run failure");
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
