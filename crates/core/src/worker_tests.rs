// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn status_display() {
    assert_eq!(WorkerStatus::Online.to_string(), "online");
    assert_eq!(WorkerStatus::Stale.to_string(), "stale");
}

#[test]
fn as_demands_mirrors_identity_fields() {
    let worker = WorkerInfo::builder()
        .hostname("host-7")
        .project_dir("/srv/seven")
        .executor_profile("gpu")
        .build();

    let demands = worker.as_demands();
    assert_eq!(demands.hostname.as_deref(), Some("host-7"));
    assert_eq!(demands.project_dir.as_deref(), Some("/srv/seven"));
    assert_eq!(demands.executor_profile.as_deref(), Some("gpu"));
    assert!(demands.executor_type.is_none());
}

#[test]
fn owns_agent_checks_owned_set() {
    let mut owned = std::collections::BTreeSet::new();
    owned.insert("reviewer".to_string());
    let worker = WorkerInfo::builder().owned_agents(owned).build();

    assert!(worker.owns_agent("reviewer"));
    assert!(!worker.owns_agent("planner"));
}
