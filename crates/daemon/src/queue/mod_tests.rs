// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::registry::{RegisterRequest, WorkerRegistry};
use oj_core::{FakeClock, RunnerDemands, SessionId};
use std::collections::BTreeSet;

fn queue() -> (RunQueue<FakeClock>, Arc<WorkerRegistry<FakeClock>>) {
    let registry = Arc::new(WorkerRegistry::new(FakeClock::new()));
    let stop_queue = Arc::new(StopQueue::new());
    (RunQueue::new(registry.clone(), stop_queue, chrono::Duration::seconds(300)), registry)
}

fn register(registry: &WorkerRegistry<FakeClock>, hostname: &str) -> WorkerId {
    registry
        .register(RegisterRequest {
            hostname: hostname.to_string(),
            project_dir: "/srv".to_string(),
            executor_profile: "default".to_string(),
            tags: BTreeSet::new(),
            require_matching_tags: false,
            owned_agents: BTreeSet::new(),
        })
        .expect("register")
        .worker_id
}

#[tokio::test]
async fn poll_returns_no_work_when_queue_empty() {
    let (queue, registry) = queue();
    let worker = register(&registry, "host-a");
    match queue.poll(&worker, Duration::from_millis(20)).await.expect("poll") {
        PollOutcome::NoWork => {}
        _ => panic!("expected no work"),
    }
}

#[tokio::test]
async fn enqueue_then_poll_claims_run() {
    let (queue, registry) = queue();
    let worker = register(&registry, "host-a");

    let run = Run::new_start(SessionId::new(), RunnerDemands::default(), Utc::now());
    let run_id = run.run_id.clone();
    queue.enqueue(run);

    match queue.poll(&worker, Duration::from_millis(50)).await.expect("poll") {
        PollOutcome::Run(claimed) => {
            assert_eq!(claimed.run_id, run_id);
            assert_eq!(claimed.status, RunStatus::Claimed);
            assert_eq!(claimed.claimed_by, Some(worker));
        }
        _ => panic!("expected a claimed run"),
    }
}

#[tokio::test]
async fn poll_skips_runs_whose_demands_do_not_match() {
    let (queue, registry) = queue();
    let worker = register(&registry, "host-a");

    let mut demands = RunnerDemands::default();
    demands.hostname = Some("host-b".to_string());
    let run = Run::new_start(SessionId::new(), demands, Utc::now());
    queue.enqueue(run);

    match queue.poll(&worker, Duration::from_millis(20)).await.expect("poll") {
        PollOutcome::NoWork => {}
        _ => panic!("worker should not match a different hostname demand"),
    }
}

#[tokio::test]
async fn report_completed_requires_owning_worker() {
    let (queue, registry) = queue();
    let owner = register(&registry, "host-a");
    let other = register(&registry, "host-b");

    let run = Run::new_start(SessionId::new(), RunnerDemands::default(), Utc::now());
    queue.enqueue(run);
    let claimed = match queue.poll(&owner, Duration::from_millis(20)).await.expect("poll") {
        PollOutcome::Run(run) => run,
        _ => panic!("expected claim"),
    };

    let err = queue.report_completed(&other, &claimed.run_id, None).expect_err("not the owner");
    assert_eq!(err.code(), "forbidden");

    let completed = queue.report_completed(&owner, &claimed.run_id, None).expect("owner completes");
    assert_eq!(completed.status, RunStatus::Completed);
}

#[tokio::test]
async fn request_stop_on_pending_run_stops_immediately() {
    let (queue, _registry) = queue();
    let run = Run::new_start(SessionId::new(), RunnerDemands::default(), Utc::now());
    let run_id = run.run_id.clone();
    queue.enqueue(run);

    let stopped = queue.request_stop(&run_id).expect("stop");
    assert_eq!(stopped.status, RunStatus::Stopped);
}

#[tokio::test]
async fn request_stop_on_claimed_run_pushes_stop_command() {
    let (queue, registry) = queue();
    let worker = register(&registry, "host-a");
    let run = Run::new_start(SessionId::new(), RunnerDemands::default(), Utc::now());
    queue.enqueue(run);

    let claimed = match queue.poll(&worker, Duration::from_millis(20)).await.expect("poll") {
        PollOutcome::Run(run) => run,
        _ => panic!("expected claim"),
    };

    let stopping = queue.request_stop(&claimed.run_id).expect("stop");
    assert_eq!(stopping.status, RunStatus::Stopping);

    match queue.poll(&worker, Duration::from_millis(20)).await.expect("poll") {
        PollOutcome::StopCommands(ids) => assert_eq!(ids, vec![claimed.run_id]),
        _ => panic!("expected a stop command on next poll"),
    }
}

#[tokio::test]
async fn request_stop_on_terminal_run_is_bad_state() {
    let (queue, registry) = queue();
    let worker = register(&registry, "host-a");
    let run = Run::new_start(SessionId::new(), RunnerDemands::default(), Utc::now());
    queue.enqueue(run);
    let claimed = match queue.poll(&worker, Duration::from_millis(20)).await.expect("poll") {
        PollOutcome::Run(run) => run,
        _ => panic!("expected claim"),
    };
    queue.report_completed(&worker, &claimed.run_id, None).expect("complete");

    let err = queue.request_stop(&claimed.run_id).expect_err("already terminal");
    assert_eq!(err.code(), "bad_state");
}

#[tokio::test]
async fn fail_runs_owned_by_marks_active_runs_as_worker_lost() {
    let (queue, registry) = queue();
    let worker = register(&registry, "host-a");
    let run = Run::new_start(SessionId::new(), RunnerDemands::default(), Utc::now());
    queue.enqueue(run);
    let claimed = match queue.poll(&worker, Duration::from_millis(20)).await.expect("poll") {
        PollOutcome::Run(run) => run,
        _ => panic!("expected claim"),
    };

    let failed = queue.fail_runs_owned_by(&worker);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].run_id, claimed.run_id);
    assert_eq!(failed[0].error.as_deref(), Some("WorkerLost"));
}

#[tokio::test]
async fn sweep_no_match_fails_expired_pending_runs_with_demands() {
    let (queue, _registry) = queue();
    let mut demands = RunnerDemands::default();
    demands.hostname = Some("nowhere".to_string());
    let mut run = Run::new_start(SessionId::new(), demands, Utc::now());
    run.created_at = Utc::now() - chrono::Duration::seconds(301);
    queue.enqueue(run.clone());

    let expired = queue.sweep_no_match();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].run_id, run.run_id);
    assert_eq!(expired[0].error.as_deref(), Some("NoEligibleWorker"));
}

#[tokio::test]
async fn sweep_no_match_ignores_runs_without_demands() {
    let (queue, _registry) = queue();
    let mut run = Run::new_start(SessionId::new(), RunnerDemands::default(), Utc::now());
    run.created_at = Utc::now() - chrono::Duration::seconds(301);
    queue.enqueue(run);

    assert!(queue.sweep_no_match().is_empty());
}
