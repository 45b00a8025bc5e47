// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jobctl_core::{EventType, FakeClock, JobType, Payload, Phase};

fn store() -> Arc<InMemoryJobStore<FakeClock>> {
    InMemoryJobStore::new(FakeClock::new())
}

fn new_job() -> Job {
    Job::new(JobId::new(), JobType::Pipeline, "quantum computing", Payload::default(), chrono::Utc::now(), 7)
}

#[tokio::test]
async fn create_then_read_round_trips() {
    let store = store();
    let job = new_job();
    let id = job.id;
    store.create(job.clone()).await.expect("create");
    let read = store.point_read(&id).await.expect("read").expect("present");
    assert_eq!(read.id, id);
}

#[tokio::test]
async fn create_twice_errors() {
    let store = store();
    let job = new_job();
    store.create(job.clone()).await.expect("first create");
    let err = store.create(job).await.expect_err("duplicate should error");
    assert!(matches!(err, Error::AlreadyExists(_)));
}

#[tokio::test]
async fn patch_missing_job_errors() {
    let store = store();
    let err = store
        .patch(&JobId::new(), &[PatchOp::SetStatus(JobStatus::Running)])
        .await
        .expect_err("missing job");
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn patch_applies_ops_in_order() {
    let store = store();
    let job = new_job();
    let id = job.id;
    store.create(job).await.expect("create");
    let patched = store
        .patch(&id, &[PatchOp::Advance { status: JobStatus::Running, phase: Phase::Ranking }])
        .await
        .expect("patch");
    assert_eq!(patched.status, JobStatus::Running);
    assert_eq!(patched.phase, Phase::Ranking);
}

#[tokio::test]
async fn patch_on_terminal_job_is_ignored() {
    let store = store();
    let job = new_job();
    let id = job.id;
    store.create(job).await.expect("create");
    store.patch(&id, &[PatchOp::SetStatus(JobStatus::Completed)]).await.expect("complete");
    let after = store
        .patch(&id, &[PatchOp::SetStatus(JobStatus::Running)])
        .await
        .expect("patch is a no-op, not an error");
    assert_eq!(after.status, JobStatus::Completed);
}

#[tokio::test]
async fn query_filters_by_predicate() {
    let store = store();
    let a = new_job();
    let mut b = new_job();
    b.status = JobStatus::Running;
    store.create(a).await.expect("create a");
    store.create(b.clone()).await.expect("create b");

    let running = store.query(&|j: &Job| j.status == JobStatus::Running).await.expect("query");
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, b.id);
}

#[tokio::test]
async fn events_are_bounded_and_fifo() {
    let store = store();
    let job = new_job();
    let id = job.id;
    store.create(job).await.expect("create");
    for i in 0..5 {
        let ev = Event::new(chrono::Utc::now(), EventType::JobCreated, Phase::Search, format!("e{i}"));
        store.append_event(&id, ev, 3).await.expect("append");
    }
    let events = store.events(&id).await.expect("events");
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].message, "e2");
}

#[tokio::test]
async fn events_on_missing_job_errors() {
    let store = store();
    let err = store
        .append_event(&JobId::new(), Event::new(chrono::Utc::now(), EventType::JobCreated, Phase::Search, "x"), 10)
        .await
        .expect_err("missing job");
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn health_check_is_always_ok_for_in_memory_store() {
    let store = store();
    store.health_check().await.expect("healthy");
}
