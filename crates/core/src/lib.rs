// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! oj-core: shared domain types for the agent-session coordinator.
//!
//! This crate has no knowledge of HTTP, SQL, or the worker wire protocol —
//! those live in `oj-daemon` and `oj-storage`. It defines the entities every
//! other crate speaks in: sessions, events, runs, workers, demands, and the
//! unified error taxonomy.

pub mod macros;

pub mod clock;
pub mod demand;
pub mod error;
pub mod event;
pub mod id;
pub mod ids;
pub mod run;
pub mod session;
pub mod worker;

pub use clock::{Clock, FakeClock, SystemClock};
pub use demand::{resolve_demands, DemandResolutionInputs, ExecutorType, RunnerDemands};
pub use error::CoordinatorError;
pub use event::{Event, EventType, SessionStopPayload};
pub use id::short;
pub use ids::{RunId, SessionId, WorkerId};
pub use run::{Run, RunStatus, RunType};
pub use session::{Affinity, ExecutionMode, Session, SessionStatus};
pub use worker::{WorkerInfo, WorkerStatus};

#[cfg(any(test, feature = "test-support"))]
pub use run::RunBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use session::SessionBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use worker::WorkerInfoBuilder;
