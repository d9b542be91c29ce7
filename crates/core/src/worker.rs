// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker: a registered remote process capable of claiming and executing runs.

use serde::{Deserialize, Serialize};

use crate::demand::RunnerDemands;
use crate::ids::WorkerId;

/// A worker's reachability as seen by the registry's heartbeat sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Online,
    Stale,
}

crate::simple_display! {
    WorkerStatus {
        Online => "online",
        Stale => "stale",
    }
}

/// A registered worker process.
///
/// `worker_id` is derived, not chosen, so a worker that restarts without
/// deregistering reconnects to the same entry (see [`WorkerId::derive`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub worker_id: WorkerId,
    pub hostname: String,
    pub project_dir: String,
    pub executor_profile: String,
    #[serde(default)]
    pub tags: std::collections::BTreeSet<String>,
    pub status: WorkerStatus,
    pub registered_at: chrono::DateTime<chrono::Utc>,
    pub last_heartbeat_at: chrono::DateTime<chrono::Utc>,
    /// Blueprint names this worker owns exclusively, if any — consulted by
    /// the demand resolver's worker-owned-agent rule.
    #[serde(default)]
    pub owned_agents: std::collections::BTreeSet<String>,
}

impl WorkerInfo {
    /// The demands a run would need to satisfy to land exclusively on this
    /// worker (demand resolver rule 1 / session affinity rule 2).
    pub fn as_demands(&self) -> RunnerDemands {
        RunnerDemands {
            hostname: Some(self.hostname.clone()),
            project_dir: Some(self.project_dir.clone()),
            executor_profile: Some(self.executor_profile.clone()),
            executor_type: None,
            tags: self.tags.clone(),
        }
    }

    pub fn owns_agent(&self, agent_name: &str) -> bool {
        self.owned_agents.contains(agent_name)
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct WorkerInfoBuilder => WorkerInfo {
        set { worker_id: WorkerId = WorkerId::from_string("wrkr_test") }
        into { hostname: String = "host-1" }
        into { project_dir: String = "/srv/proj" }
        into { executor_profile: String = "default" }
        set { tags: std::collections::BTreeSet<String> = Default::default() }
        set { status: WorkerStatus = WorkerStatus::Online }
        set { registered_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now() }
        set { last_heartbeat_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now() }
        set { owned_agents: std::collections::BTreeSet<String> = Default::default() }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
