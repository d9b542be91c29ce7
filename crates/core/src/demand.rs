// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Demand resolution: folding together the predicate a run must satisfy to
//! match a worker, from several sources of decreasing precedence.
//!
//! Precedence, highest first: worker-owned agent, session affinity (resumes
//! only), blueprint demands, script demands, the agent-type demand, and
//! finally caller-supplied additional demands. A later source never
//! overrides a scalar field an earlier source already set; `tags` always
//! union across every source.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Whether a blueprint's executor drives itself (`autonomous`) or is driven
/// by an external script/procedure (`procedural`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorType {
    Autonomous,
    Procedural,
}

crate::simple_display! {
    ExecutorType {
        Autonomous => "autonomous",
        Procedural => "procedural",
    }
}

impl Default for ExecutorType {
    fn default() -> Self {
        Self::Autonomous
    }
}

/// The predicate a run's demands impose on candidate workers.
///
/// Scalar fields are matched exactly when present; `None` means "no
/// constraint on this field." `tags` are matched as a subset: a worker must
/// carry every tag a run demands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerDemands {
    pub hostname: Option<String>,
    pub project_dir: Option<String>,
    pub executor_profile: Option<String>,
    pub executor_type: Option<ExecutorType>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl RunnerDemands {
    /// Merge `other` into `self` at lower precedence: scalar fields already
    /// set in `self` are kept; unset scalar fields take `other`'s value.
    /// Tags always union.
    pub fn merge_lower_precedence(mut self, other: RunnerDemands) -> Self {
        self.hostname = self.hostname.or(other.hostname);
        self.project_dir = self.project_dir.or(other.project_dir);
        self.executor_profile = self.executor_profile.or(other.executor_profile);
        self.executor_type = self.executor_type.or(other.executor_type);
        self.tags.extend(other.tags);
        self
    }

    /// Whether a worker advertising `candidate` satisfies these demands.
    pub fn matches(&self, candidate: &RunnerDemands) -> bool {
        if let Some(h) = &self.hostname {
            if candidate.hostname.as_deref() != Some(h.as_str()) {
                return false;
            }
        }
        if let Some(p) = &self.project_dir {
            if candidate.project_dir.as_deref() != Some(p.as_str()) {
                return false;
            }
        }
        if let Some(e) = &self.executor_profile {
            if candidate.executor_profile.as_deref() != Some(e.as_str()) {
                return false;
            }
        }
        if let Some(t) = self.executor_type {
            if candidate.executor_type != Some(t) {
                return false;
            }
        }
        self.tags.is_subset(&candidate.tags)
    }

    pub fn is_empty(&self) -> bool {
        self.hostname.is_none()
            && self.project_dir.is_none()
            && self.executor_profile.is_none()
            && self.executor_type.is_none()
            && self.tags.is_empty()
    }
}

/// Inputs to demand resolution, in source order (highest precedence first).
/// Any source may be absent; absent sources simply contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct DemandResolutionInputs {
    /// Demands pinned by the run's target worker owning the referenced
    /// agent blueprint (rule 1).
    pub worker_owned: Option<RunnerDemands>,
    /// Session affinity for a `resume_session` run (rule 2): hostname and
    /// executor profile copied from the existing session row.
    pub session_affinity: Option<RunnerDemands>,
    /// The agent blueprint's own demands (rule 3).
    pub blueprint: Option<RunnerDemands>,
    /// Demand tags contributed by a script the blueprint references (rule 4).
    pub script: Option<RunnerDemands>,
    /// The blueprint's declared executor type, defaulting to `autonomous`
    /// (rule 5) — always contributes, never absent.
    pub executor_type: ExecutorType,
    /// Caller-supplied additional demands (rule 6), lowest precedence.
    pub additional: Option<RunnerDemands>,
}

/// Fold the precedence chain described in the module docs into a single
/// [`RunnerDemands`].
pub fn resolve_demands(inputs: DemandResolutionInputs) -> RunnerDemands {
    let executor_type_demand = RunnerDemands {
        executor_type: Some(inputs.executor_type),
        ..Default::default()
    };

    let mut chain = vec![executor_type_demand];
    if let Some(script) = inputs.script {
        chain.push(script);
    }
    if let Some(blueprint) = inputs.blueprint {
        chain.push(blueprint);
    }
    if let Some(affinity) = inputs.session_affinity {
        chain.push(affinity);
    }
    if let Some(owned) = inputs.worker_owned {
        chain.push(owned);
    }

    let mut result = inputs.additional.unwrap_or_default();
    // `chain` holds sources lowest-to-highest precedence; fold forward so
    // each step treats the accumulated `result` as strictly lower precedence
    // than the source being merged in.
    for next in chain {
        result = next.merge_lower_precedence(result);
    }
    result
}

#[cfg(test)]
#[path = "demand_tests.rs"]
mod tests;
