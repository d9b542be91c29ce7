// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stop-Command Queue (C4): a per-worker FIFO of `run_id`s a worker must
//! terminate, plus the deregistration signal.
//!
//! Workers must treat stop commands as advisory but are contractually
//! required to terminate the named run and call `report_stopped`.

use std::collections::HashMap;

use oj_core::{RunId, WorkerId};
use parking_lot::Mutex;

#[derive(Default)]
struct State {
    mailboxes: HashMap<WorkerId, Vec<RunId>>,
}

#[derive(Default)]
pub struct StopQueue {
    state: Mutex<State>,
}

impl StopQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_stop(&self, worker_id: &WorkerId, run_id: RunId) {
        self.state.lock().mailboxes.entry(worker_id.clone()).or_default().push(run_id);
    }

    /// Returns and clears any queued stop commands for `worker_id`.
    pub fn drain(&self, worker_id: &WorkerId) -> Vec<RunId> {
        self.state.lock().mailboxes.remove(worker_id).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
