// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared application state every Axum handler receives: one `Arc` per
//! component, never a global. See §9 "Global mutable state".

use std::sync::Arc;

use oj_core::{Clock, SystemClock};
use oj_storage::SessionStore;

use crate::callback::CallbackProcessor;
use crate::config::Config;
use crate::orchestrator::SessionOrchestrator;
use crate::queue::RunQueue;
use crate::registry::WorkerRegistry;
use crate::stop::StopQueue;

#[derive(Clone)]
pub struct AppState<C: Clock = SystemClock> {
    pub store: Arc<SessionStore>,
    pub registry: Arc<WorkerRegistry<C>>,
    pub queue: Arc<RunQueue<C>>,
    pub stop_queue: Arc<StopQueue>,
    pub callback: Arc<CallbackProcessor>,
    pub orchestrator: Arc<SessionOrchestrator<C>>,
    pub config: Arc<Config>,
}

impl<C: Clock + 'static> AppState<C> {
    pub fn new(store: Arc<SessionStore>, clock: C, config: Config) -> Self {
        let registry = Arc::new(WorkerRegistry::new(clock));
        let stop_queue = Arc::new(StopQueue::new());
        let queue = Arc::new(RunQueue::new(registry.clone(), stop_queue.clone(), config.no_match_timeout));
        let callback = Arc::new(CallbackProcessor::new());
        let orchestrator = Arc::new(SessionOrchestrator::new(store.clone(), queue.clone(), callback.clone()));

        Self { store, registry, queue, stop_queue, callback, orchestrator, config: Arc::new(config) }
    }
}
