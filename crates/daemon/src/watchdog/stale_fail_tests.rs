// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use jobctl_core::{Config, FakeClock, Job, JobId, JobStatus, JobType, Payload, Phase};
use jobctl_storage::{InMemoryJobStore, JobStore as _};

use super::*;

fn test_config() -> Config {
    let mut cfg = Config::from_env();
    cfg.job_stale_minutes = 1;
    cfg
}

fn baseline(clock: &FakeClock) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp_millis(clock.epoch_ms() as i64).expect("valid timestamp")
}

#[tokio::test]
async fn stale_running_job_is_failed_with_elapsed_minutes() {
    let clock = FakeClock::new();
    let store = InMemoryJobStore::new(clock.clone());
    let mut job = Job::new(JobId::new(), JobType::Pipeline, "q", Payload::default(), baseline(&clock), 7);
    job.status = JobStatus::Running;
    job.phase = Phase::Ranking;
    let id = job.id;
    store.create(job).await.expect("create");

    clock.advance(Duration::from_secs(120));

    let dyn_store: Arc<dyn JobStore> = store.clone();
    let watchdog = StaleFailWatchdog::new(dyn_store, clock, test_config());
    watchdog.tick().await;

    let after = store.point_read(&id).await.expect("read").expect("present");
    assert_eq!(after.status, JobStatus::Failed);
    assert!(after.error.expect("error set").contains("2 minute"));

    let events = store.events(&id).await.expect("events");
    assert!(events.iter().any(|e| e.event_type == EventType::StaleDetected));
}

#[tokio::test]
async fn fresh_running_job_is_left_alone() {
    let clock = FakeClock::new();
    let store = InMemoryJobStore::new(clock.clone());
    let mut job = Job::new(JobId::new(), JobType::Pipeline, "q", Payload::default(), baseline(&clock), 7);
    job.status = JobStatus::Running;
    let id = job.id;
    store.create(job).await.expect("create");

    clock.advance(Duration::from_secs(5));

    let dyn_store: Arc<dyn JobStore> = store.clone();
    let watchdog = StaleFailWatchdog::new(dyn_store, clock, test_config());
    watchdog.tick().await;

    let after = store.point_read(&id).await.expect("read").expect("present");
    assert_eq!(after.status, JobStatus::Running);
}

#[tokio::test]
async fn queued_jobs_are_ignored() {
    let clock = FakeClock::new();
    let store = InMemoryJobStore::new(clock.clone());
    let job = Job::new(JobId::new(), JobType::Pipeline, "q", Payload::default(), baseline(&clock), 7);
    let id = job.id;
    store.create(job).await.expect("create");

    clock.advance(Duration::from_secs(3600));

    let dyn_store: Arc<dyn JobStore> = store.clone();
    let watchdog = StaleFailWatchdog::new(dyn_store, clock, test_config());
    watchdog.tick().await;

    let after = store.point_read(&id).await.expect("read").expect("present");
    assert_eq!(after.status, JobStatus::Queued);
}
