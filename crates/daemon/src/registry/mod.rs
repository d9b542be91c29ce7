// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Registry (C2): an in-memory map of registered worker processes.
//!
//! `worker_id` is derived deterministically from a worker's identifying
//! properties, so a worker process that restarts without deregistering
//! reconnects to the same entry instead of accumulating duplicates.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use oj_core::{Clock, CoordinatorError, RunnerDemands, WorkerId, WorkerInfo, WorkerStatus};
use parking_lot::Mutex;

/// Input to [`WorkerRegistry::register`].
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub hostname: String,
    pub project_dir: String,
    pub executor_profile: String,
    pub tags: std::collections::BTreeSet<String>,
    pub require_matching_tags: bool,
    pub owned_agents: std::collections::BTreeSet<String>,
}

/// Per-worker bookkeeping the registry tracks beyond the plain `WorkerInfo`
/// shape shared with other components.
struct Entry {
    info: WorkerInfo,
    require_matching_tags: bool,
    pending_deregister: bool,
}

struct State {
    workers: HashMap<WorkerId, Entry>,
    /// Reverse index: blueprint name -> owning worker, to detect collisions.
    agent_owners: HashMap<String, WorkerId>,
}

pub struct WorkerRegistry<C: Clock> {
    state: Mutex<State>,
    clock: C,
}

impl<C: Clock> WorkerRegistry<C> {
    pub fn new(clock: C) -> Self {
        Self {
            state: Mutex::new(State { workers: HashMap::new(), agent_owners: HashMap::new() }),
            clock,
        }
    }

    /// Wall-clock time as seen through this registry's [`Clock`], so tests
    /// can drive heartbeat/staleness timing with a `FakeClock`.
    fn now(&self) -> chrono::DateTime<Utc> {
        chrono::DateTime::from_timestamp_millis(self.clock.epoch_ms() as i64).unwrap_or_else(Utc::now)
    }

    /// Register a worker, or treat an existing identity as a reconnection.
    pub fn register(&self, request: RegisterRequest) -> Result<WorkerInfo, CoordinatorError> {
        let worker_id = WorkerId::derive(&request.hostname, &request.project_dir, &request.executor_profile);
        let mut state = self.state.lock();

        for agent in &request.owned_agents {
            if let Some(existing_owner) = state.agent_owners.get(agent) {
                if existing_owner != &worker_id {
                    return Err(CoordinatorError::Conflict(format!(
                        "agent {agent:?} is already owned by worker {existing_owner}"
                    )));
                }
            }
        }

        let now = self.now();
        if let Some(entry) = state.workers.get_mut(&worker_id) {
            entry.info.last_heartbeat_at = now;
            entry.info.status = WorkerStatus::Online;
            entry.pending_deregister = false;
            entry.info.tags = request.tags;
            entry.info.owned_agents = request.owned_agents.clone();
            entry.require_matching_tags = request.require_matching_tags;
            for agent in &request.owned_agents {
                state.agent_owners.insert(agent.clone(), worker_id.clone());
            }
            return Ok(entry.info.clone());
        }

        let info = WorkerInfo {
            worker_id: worker_id.clone(),
            hostname: request.hostname,
            project_dir: request.project_dir,
            executor_profile: request.executor_profile,
            tags: request.tags,
            status: WorkerStatus::Online,
            registered_at: now,
            last_heartbeat_at: now,
            owned_agents: request.owned_agents.clone(),
        };

        for agent in &request.owned_agents {
            state.agent_owners.insert(agent.clone(), worker_id.clone());
        }
        state.workers.insert(
            worker_id,
            Entry { info: info.clone(), require_matching_tags: request.require_matching_tags, pending_deregister: false },
        );
        Ok(info)
    }

    pub fn heartbeat(&self, worker_id: &WorkerId) -> Result<(), CoordinatorError> {
        let mut state = self.state.lock();
        let entry = state
            .workers
            .get_mut(worker_id)
            .ok_or_else(|| CoordinatorError::not_found_worker(worker_id))?;
        entry.info.last_heartbeat_at = self.now();
        entry.info.status = WorkerStatus::Online;
        Ok(())
    }

    pub fn mark_deregistered(&self, worker_id: &WorkerId) -> Result<(), CoordinatorError> {
        let mut state = self.state.lock();
        let entry = state
            .workers
            .get_mut(worker_id)
            .ok_or_else(|| CoordinatorError::not_found_worker(worker_id))?;
        entry.pending_deregister = true;
        Ok(())
    }

    /// Returns `true` once, the first time the deregister flag is observed,
    /// and removes the worker from the registry.
    pub fn take_deregister_signal(&self, worker_id: &WorkerId) -> bool {
        let mut state = self.state.lock();
        let pending = state.workers.get(worker_id).map(|e| e.pending_deregister).unwrap_or(false);
        if pending {
            if let Some(entry) = state.workers.remove(worker_id) {
                for agent in entry.info.owned_agents {
                    state.agent_owners.remove(&agent);
                }
            }
        }
        pending
    }

    /// Online -> stale after `stale_after`; stale -> removed after
    /// `remove_after`. Returns the worker ids just removed so the caller can
    /// fail their owned runs.
    pub fn lifecycle_sweep(&self, stale_after: chrono::Duration, remove_after: chrono::Duration) -> Vec<WorkerId> {
        let now = self.now();
        let mut state = self.state.lock();
        let mut removed = Vec::new();

        for (id, entry) in state.workers.iter_mut() {
            let silence = now - entry.info.last_heartbeat_at;
            if silence >= remove_after {
                removed.push(id.clone());
            } else if silence >= stale_after {
                entry.info.status = WorkerStatus::Stale;
            }
        }

        for id in &removed {
            if let Some(entry) = state.workers.remove(id) {
                for agent in entry.info.owned_agents {
                    state.agent_owners.remove(&agent);
                }
            }
        }

        removed
    }

    /// Lock-free-from-the-caller's-perspective snapshot scan: workers whose
    /// advertised demands satisfy `predicate`.
    pub fn find_candidates(&self, predicate: &RunnerDemands) -> Vec<WorkerInfo> {
        let state = self.state.lock();
        state
            .workers
            .values()
            .filter(|entry| entry_satisfies(entry, predicate))
            .map(|entry| entry.info.clone())
            .collect()
    }

    /// Whether a specific worker, looked up by id, satisfies `demands` —
    /// the same predicate [`find_candidates`] uses, scoped to one worker so
    /// the Run Queue can re-check a candidate under its own lock without
    /// duplicating the tag-requirement rule.
    pub fn worker_satisfies(&self, worker_id: &WorkerId, demands: &RunnerDemands) -> bool {
        let state = self.state.lock();
        state.workers.get(worker_id).is_some_and(|entry| entry_satisfies(entry, demands))
    }

    pub fn get(&self, worker_id: &WorkerId) -> Option<WorkerInfo> {
        self.state.lock().workers.get(worker_id).map(|e| e.info.clone())
    }

    pub fn owner_of_agent(&self, agent_name: &str) -> Option<WorkerId> {
        self.state.lock().agent_owners.get(agent_name).cloned()
    }

    #[cfg(test)]
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

fn entry_satisfies(entry: &Entry, predicate: &RunnerDemands) -> bool {
    if entry.info.status != WorkerStatus::Online {
        return false;
    }
    if entry.require_matching_tags && entry.info.tags.is_disjoint(&predicate.tags) {
        return false;
    }
    predicate.matches(&entry.info.as_demands())
}

pub type SharedWorkerRegistry<C> = Arc<WorkerRegistry<C>>;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
