// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change notifications published by the session store after each commit.
//!
//! The store is the only component that publishes session-level
//! notifications; the realtime stream (oj-daemon's `server::realtime`)
//! subscribes to these directly.

use oj_core::{Event, Session, SessionId};

#[derive(Debug, Clone)]
pub enum ChangeNotification {
    SessionCreated(Session),
    SessionUpdated(Session),
    SessionDeleted(SessionId),
    EventAppended(Event),
}

/// Default capacity of the broadcast channel backing the store's change
/// notifications. Slow subscribers fall behind and observe
/// `RecvError::Lagged` rather than stalling publishers.
pub const CHANNEL_CAPACITY: usize = 1024;
