// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jobctl_core::{FakeClock, JobType, Payload};
use jobctl_storage::InMemoryJobStore;

async fn reporter_with_job() -> (ProgressReporter<FakeClock>, JobId, Arc<dyn JobStore>) {
    let store = InMemoryJobStore::new(FakeClock::new());
    let job = jobctl_core::Job::new(JobId::new(), JobType::Pipeline, "q", Payload::default(), chrono::Utc::now(), 7);
    let id = job.id;
    store.create(job).await.expect("create");
    let dyn_store: Arc<dyn JobStore> = store;
    let reporter = ProgressReporter::new(dyn_store.clone(), FakeClock::new(), 100);
    (reporter, id, dyn_store)
}

#[tokio::test]
async fn update_progress_persists_to_store() {
    let (reporter, id, store) = reporter_with_job().await;
    let progress = Progress {
        steps_completed: 1,
        steps_total: 3,
        step_name: "Searching".to_string(),
        message: "fetching papers".to_string(),
    };
    reporter.update_progress(id, progress.clone()).await;

    let job = store.point_read(&id).await.expect("read").expect("present");
    assert_eq!(job.progress, progress);
}

#[tokio::test]
async fn update_progress_on_missing_job_does_not_panic() {
    let (reporter, _id, _store) = reporter_with_job().await;
    reporter.update_progress(JobId::new(), Progress::queued()).await;
}

#[tokio::test]
async fn append_event_persists_to_log() {
    let (reporter, id, store) = reporter_with_job().await;
    reporter
        .append_event(id, EventType::StageStarted, Phase::Search, "beginning search")
        .await;

    let events = store.events(&id).await.expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "beginning search");
}

#[tokio::test]
async fn append_event_on_missing_job_does_not_panic() {
    let (reporter, _id, _store) = reporter_with_job().await;
    reporter
        .append_event(JobId::new(), EventType::JobFailed, Phase::Report, "oops")
        .await;
}
