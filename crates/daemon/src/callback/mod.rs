// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callback Processor (C5): turns child-session completion into
//! parent-resume runs.
//!
//! The prompt templates below are reproduced byte-for-byte from the
//! reference behavior external agents already depend on — do not reword
//! them.

use std::collections::{HashMap, HashSet};

use oj_core::SessionId;
use parking_lot::Mutex;

/// One child's outcome, queued until its parent is free to resume.
#[derive(Debug, Clone)]
pub struct ChildOutcome {
    pub child_id: SessionId,
    pub result: Option<String>,
    pub failed: bool,
    pub error: Option<String>,
}

/// Whether a parent was ready to receive the result immediately or the
/// notification was only queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryDecision {
    /// Deliver now: build and enqueue a resume run for `parent_id` with the
    /// given single outcome.
    DeliverNow { parent_id: SessionId, outcome: ChildOutcome },
    Queued,
    /// Self-loop (`child_id == parent_id`): dropped, nothing to do.
    Dropped,
}

/// The result of a parent reaching a terminal state: whether any queued
/// outcomes should now be delivered as one aggregated resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregatedDelivery {
    DeliverNow { parent_id: SessionId, outcomes: Vec<ChildOutcome> },
    Nothing,
}

struct State {
    pending: HashMap<SessionId, Vec<ChildOutcome>>,
    resume_in_flight: HashSet<SessionId>,
}

pub struct CallbackProcessor {
    state: Mutex<State>,
}

impl CallbackProcessor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State { pending: HashMap::new(), resume_in_flight: HashSet::new() }),
        }
    }

    /// A child session reached a terminal state. `parent_finished` reflects
    /// the parent's *current* status at the moment of the callback — the
    /// original `parent_status == finished` check.
    pub fn on_child_completed(
        &self,
        child_id: SessionId,
        parent_id: SessionId,
        parent_finished: bool,
        outcome: ChildOutcome,
    ) -> DeliveryDecision {
        if child_id == parent_id {
            tracing::warn!(%child_id, "callback processor: dropping self-loop");
            return DeliveryDecision::Dropped;
        }

        let mut state = self.state.lock();
        if state.resume_in_flight.contains(&parent_id) {
            state.pending.entry(parent_id).or_default().push(outcome);
            return DeliveryDecision::Queued;
        }

        if parent_finished {
            state.resume_in_flight.insert(parent_id.clone());
            DeliveryDecision::DeliverNow { parent_id, outcome }
        } else {
            state.pending.entry(parent_id).or_default().push(outcome);
            DeliveryDecision::Queued
        }
    }

    /// Any session (parent or not) reached a terminal state. Clears its
    /// in-flight flag and, if outcomes queued up while it was busy, hands
    /// them back as a single aggregated delivery.
    pub fn on_session_stopped(&self, session_id: &SessionId) -> AggregatedDelivery {
        let mut state = self.state.lock();
        state.resume_in_flight.remove(session_id);

        match state.pending.remove(session_id) {
            Some(outcomes) if !outcomes.is_empty() => {
                state.resume_in_flight.insert(session_id.clone());
                AggregatedDelivery::DeliverNow { parent_id: session_id.clone(), outcomes }
            }
            _ => AggregatedDelivery::Nothing,
        }
    }

    #[cfg(test)]
    fn is_in_flight(&self, session_id: &SessionId) -> bool {
        self.state.lock().resume_in_flight.contains(session_id)
    }

    #[cfg(test)]
    fn pending_count(&self, session_id: &SessionId) -> usize {
        self.state.lock().pending.get(session_id).map(Vec::len).unwrap_or(0)
    }
}

impl Default for CallbackProcessor {
    fn default() -> Self {
        Self::new()
    }
}

const NO_RESULT_PLACEHOLDER: &str = "(No result available)";
const UNKNOWN_ERROR_PLACEHOLDER: &str = "Unknown error";

/// Build the resume prompt for a single child outcome.
pub fn build_single_prompt(outcome: &ChildOutcome) -> String {
    if outcome.failed {
        let error = outcome.error.as_deref().unwrap_or(UNKNOWN_ERROR_PLACEHOLDER);
        format!(
            "The child agent session \"{}\" has failed.\n\n## Error\n\n{}\n\nPlease handle this failure and continue with the orchestration.",
            outcome.child_id, error
        )
    } else {
        let result = outcome.result.as_deref().unwrap_or(NO_RESULT_PLACEHOLDER);
        format!(
            "The child agent session \"{}\" has completed.\n\n## Child Result\n\n{}\n\nPlease continue with the orchestration based on this result.",
            outcome.child_id, result
        )
    }
}

/// Build the resume prompt aggregating every queued child outcome.
pub fn build_aggregated_prompt(outcomes: &[ChildOutcome]) -> String {
    let sections: Vec<String> = outcomes
        .iter()
        .map(|outcome| {
            let (tag, text) = if outcome.failed {
                ("FAILED", outcome.error.as_deref().unwrap_or(UNKNOWN_ERROR_PLACEHOLDER))
            } else {
                ("completed", outcome.result.as_deref().unwrap_or(NO_RESULT_PLACEHOLDER))
            };
            format!("### Child: {} ({})\n\n{}", outcome.child_id, tag, text)
        })
        .collect();

    format!(
        "Multiple child agent sessions have completed.\n\n{}\n\nPlease continue with the orchestration based on these results.",
        sections.join("\n\n---\n\n")
    )
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
