// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity types for the coordinator's three externally visible entities.
//!
//! `SessionId` and `RunId` are coordinator-minted, randomly generated opaque
//! strings (via [`crate::define_id`]). `WorkerId` is deliberately different:
//! it is a stable hash of a worker's identifying properties so that a worker
//! process which restarts without deregistering reconnects to the same slot
//! in the registry (see `oj-daemon::registry`).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Borrow;
use std::fmt;

crate::define_id! {
    /// Identifies a session: the durable unit of an agent conversation.
    pub struct SessionId("sess_");
}

crate::define_id! {
    /// Identifies a single run: one dispatch of work (start or resume) onto a worker.
    pub struct RunId("run_");
}

/// Identifies a worker process.
///
/// Derived deterministically from `(hostname, project_dir, executor_profile)`
/// via SHA-256, not randomly generated — see [`WorkerId::derive`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub const PREFIX: &'static str = "wrkr_";

    /// Deterministically derive a worker's identity from the properties that
    /// make it a distinct execution slot.
    pub fn derive(hostname: &str, project_dir: &str, executor_profile: &str) -> Self {
        let key = format!("{hostname}:{project_dir}:{executor_profile}");
        let digest = Sha256::digest(key.as_bytes());
        let hex = format!("{digest:x}");
        Self(format!("{}{}", Self::PREFIX, &hex[..12]))
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WorkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for WorkerId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for WorkerId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for WorkerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
