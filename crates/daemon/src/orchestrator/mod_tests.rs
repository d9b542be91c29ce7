// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeSet;

use super::*;
use crate::queue::PollOutcome;
use crate::registry::{RegisterRequest, WorkerRegistry};
use crate::stop::StopQueue;
use oj_core::{FakeClock, WorkerId};

async fn harness() -> (SessionOrchestrator<FakeClock>, Arc<SessionStore>, Arc<RunQueue<FakeClock>>, Arc<WorkerRegistry<FakeClock>>) {
    let pool = oj_storage::connect(":memory:").await.expect("connect");
    let store = Arc::new(SessionStore::new(pool));
    let registry = Arc::new(WorkerRegistry::new(FakeClock::new()));
    let stop_queue = Arc::new(StopQueue::new());
    let queue = Arc::new(RunQueue::new(registry.clone(), stop_queue, chrono::Duration::seconds(300)));
    let callback = Arc::new(CallbackProcessor::new());
    let orchestrator = SessionOrchestrator::new(store.clone(), queue.clone(), callback);
    (orchestrator, store, queue, registry)
}

fn register(registry: &WorkerRegistry<FakeClock>) -> WorkerId {
    registry
        .register(RegisterRequest {
            hostname: "host-a".to_string(),
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
async fn finished_parent_gets_immediate_resume() {
    let (orchestrator, store, queue, registry) = harness().await;
    let worker = register(&registry);

    let parent = store
        .create_session(SessionId::new(), Utc::now(), None, None, None, oj_core::ExecutionMode::AsyncPoll)
        .await
        .expect("create parent");
    store.set_status(&parent.session_id, SessionStatus::Running).await.expect("parent running");
    store.set_status(&parent.session_id, SessionStatus::Finished).await.expect("parent finished");

    let child = store
        .create_session(SessionId::new(), Utc::now(), Some(parent.session_id.clone()), None, None, oj_core::ExecutionMode::AsyncPoll)
        .await
        .expect("create child");
    store.set_status(&child.session_id, SessionStatus::Running).await.expect("child running");

    orchestrator
        .finish_session(&child.session_id, SessionStatus::Failed, None, Some("boom".to_string()))
        .await
        .expect("finish child");

    match queue.poll(&worker, std::time::Duration::from_millis(20)).await.expect("poll") {
        PollOutcome::Run(run) => {
            assert_eq!(run.session_id, parent.session_id);
            assert_eq!(run.run_type, oj_core::RunType::ResumeSession);
            assert!(run.prompt.unwrap().contains("has failed"));
        }
        other => panic!("expected a resume run, got {other:?}"),
    }
}

#[tokio::test]
async fn busy_parent_queues_instead_of_resuming() {
    let (orchestrator, store, queue, registry) = harness().await;
    let worker = register(&registry);

    let parent = store
        .create_session(SessionId::new(), Utc::now(), None, None, None, oj_core::ExecutionMode::AsyncPoll)
        .await
        .expect("create parent");
    store.set_status(&parent.session_id, SessionStatus::Running).await.expect("parent running");

    let child = store
        .create_session(SessionId::new(), Utc::now(), Some(parent.session_id.clone()), None, None, oj_core::ExecutionMode::AsyncPoll)
        .await
        .expect("create child");
    store.set_status(&child.session_id, SessionStatus::Running).await.expect("child running");

    orchestrator
        .finish_session(&child.session_id, SessionStatus::Failed, None, Some("boom".to_string()))
        .await
        .expect("finish child");

    match queue.poll(&worker, std::time::Duration::from_millis(20)).await.expect("poll") {
        PollOutcome::NoWork => {}
        other => panic!("parent still busy, expected no resume yet, got {other:?}"),
    }
}

#[tokio::test]
async fn parent_finishing_flushes_its_own_queued_child_outcomes() {
    let (orchestrator, store, queue, registry) = harness().await;
    let worker = register(&registry);

    let grandparent = store
        .create_session(SessionId::new(), Utc::now(), None, None, None, oj_core::ExecutionMode::AsyncPoll)
        .await
        .expect("create grandparent");
    store.set_status(&grandparent.session_id, SessionStatus::Running).await.expect("grandparent running");

    let parent = store
        .create_session(SessionId::new(), Utc::now(), Some(grandparent.session_id.clone()), None, None, oj_core::ExecutionMode::AsyncPoll)
        .await
        .expect("create parent");
    store.set_status(&parent.session_id, SessionStatus::Running).await.expect("parent running");

    let child = store
        .create_session(SessionId::new(), Utc::now(), Some(parent.session_id.clone()), None, None, oj_core::ExecutionMode::AsyncPoll)
        .await
        .expect("create child");
    store.set_status(&child.session_id, SessionStatus::Running).await.expect("child running");

    // Parent is still busy (running) when its child finishes: queued, no resume yet.
    orchestrator
        .finish_session(&child.session_id, SessionStatus::Failed, None, Some("child failed".to_string()))
        .await
        .expect("finish child");
    match queue.poll(&worker, std::time::Duration::from_millis(20)).await.expect("poll") {
        PollOutcome::NoWork => {}
        other => panic!("expected nothing queued for parent yet, got {other:?}"),
    }

    // Now the parent itself finishes: it should get a resume with the child's
    // queued outcome, even though the grandparent is still busy.
    orchestrator
        .finish_session(&parent.session_id, SessionStatus::Failed, None, Some("parent failed".to_string()))
        .await
        .expect("finish parent");

    match queue.poll(&worker, std::time::Duration::from_millis(20)).await.expect("poll") {
        PollOutcome::Run(run) => {
            assert_eq!(run.session_id, parent.session_id);
            let prompt = run.prompt.expect("prompt");
            assert!(prompt.contains("Multiple child agent sessions"));
            assert!(prompt.contains("FAILED"));
        }
        other => panic!("expected the parent's own resume with the child's outcome, got {other:?}"),
    }
}
