// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenario tests (S1-S6): drive the in-memory `JobStore` +
//! `MessageQueue` + fake `StageFn` implementations together through the
//! consumer, dlq processor, and watchdogs exactly as `jobctld` wires them,
//! without any real SEARCH/RANK/REPORT algorithm.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobctl_artifacts::{ArtifactStore, FilesystemArtifactStore};
use jobctl_core::{
    Config, DeadLetterDetails, FakeClock, Job, JobId, JobStatus, JobType, Payload, Phase, Progress, StageKind,
};
use jobctl_daemon::{Consumer, DlqProcessor, RunningRescueWatchdog, StaleFailWatchdog, Watchdog};
use jobctl_engine::{
    NoopNotifier, ProgressReporter, ProgressSink, Result as EngineResult, StageContext, StageExecutor, StageFn,
    StageOutcome,
};
use jobctl_queue::{InMemoryQueue, MessageQueue};
use jobctl_storage::{InMemoryJobStore, JobStore};
use serde_json::json;

struct ScriptedStage {
    kind: StageKind,
    outcome: StageOutcome,
}

#[async_trait]
impl StageFn for ScriptedStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, _ctx: &mut StageContext, _progress: &dyn ProgressSink) -> EngineResult<StageOutcome> {
        Ok(self.outcome.clone())
    }
}

fn test_config() -> Config {
    let mut cfg = Config::from_env();
    cfg.idempotency_reread_total_ms = 20;
    cfg.idempotency_reread_step_ms = 10;
    cfg
}

struct Harness {
    store: Arc<InMemoryJobStore<FakeClock>>,
    queue: Arc<InMemoryQueue<FakeClock>>,
    consumer: Consumer<FakeClock>,
    _artifact_dir: tempfile::TempDir,
}

fn build_harness(clock: FakeClock) -> Harness {
    let store = InMemoryJobStore::new(clock.clone());
    let dir = tempfile::tempdir().expect("tempdir");
    let artifacts: Arc<dyn ArtifactStore> = Arc::new(FilesystemArtifactStore::new(dir.path(), "results"));
    let queue = InMemoryQueue::new(clock.clone(), Duration::from_secs(300), 5);
    let dyn_store: Arc<dyn JobStore> = store.clone();
    let dyn_queue: Arc<dyn MessageQueue> = queue.clone();
    let progress: Arc<dyn ProgressSink> = Arc::new(ProgressReporter::new(dyn_store.clone(), clock.clone(), 100));

    let mut executor = StageExecutor::new(dyn_store.clone(), artifacts, dyn_queue.clone(), progress, clock.clone(), test_config());
    executor.register(Arc::new(ScriptedStage {
        kind: StageKind::Search,
        outcome: StageOutcome { result_patch: json!({"papers_found": 5}), artifacts: vec![("snowball.json".into(), b"[1,2,3]".to_vec())], empty: false },
    }));
    executor.register(Arc::new(ScriptedStage {
        kind: StageKind::Rank,
        outcome: StageOutcome {
            result_patch: json!({"ranked": true}),
            artifacts: vec![("elo_ranked_k32_pswiss.json".into(), b"[1,2,3]".to_vec())],
            empty: false,
        },
    }));
    executor.register(Arc::new(ScriptedStage {
        kind: StageKind::Report,
        outcome: StageOutcome {
            result_patch: json!({"report_url": "report_top_k10.json"}),
            artifacts: vec![("report_top_k10.json".into(), b"<html></html>".to_vec())],
            empty: false,
        },
    }));

    let consumer = Consumer::new(dyn_store, dyn_queue.clone(), Arc::new(executor), Arc::new(NoopNotifier), clock, test_config());
    Harness { store, queue, consumer, _artifact_dir: dir }
}

fn pipeline_job(clock: &FakeClock) -> Job {
    let now = chrono::DateTime::from_timestamp_millis(clock.epoch_ms() as i64).expect("valid timestamp");
    Job::new(JobId::new(), JobType::Pipeline, "neural retrieval", Payload::default(), now, 7)
}

/// Drains every ready delivery, processing each one through the consumer.
/// Returns the number handled.
async fn drain_queue(harness: &Harness) -> usize {
    let mut handled = 0;
    while let Ok(Some(delivery)) = harness.queue.receive().await {
        harness.consumer.handle(delivery).await;
        handled += 1;
    }
    handled
}

#[tokio::test(start_paused = true)]
async fn s1_happy_pipeline_completes_with_all_artifacts() {
    let clock = FakeClock::new();
    let harness = build_harness(clock.clone());
    let job = pipeline_job(&clock);
    let id = job.id;
    harness.store.create(job).await.expect("create");
    harness
        .queue
        .send(jobctl_core::Message::new(id, JobType::Pipeline, Payload { stage: Some(StageKind::Search), ..Default::default() }))
        .await
        .expect("send initial message");

    let handled = drain_queue(&harness).await;
    assert_eq!(handled, 3, "search, rank, and report each consume one message");

    let after = harness.store.point_read(&id).await.expect("read").expect("present");
    assert_eq!(after.status, JobStatus::Completed);
    assert_eq!(after.phase, Phase::Complete);
    assert_eq!(after.result["ranked"], json!(true));
    assert_eq!(after.result["report_url"], json!("report_top_k10.json"));
}

#[tokio::test(start_paused = true)]
async fn s2_empty_search_fails_without_enqueuing_ranking() {
    let clock = FakeClock::new();
    let store = InMemoryJobStore::new(clock.clone());
    let dir = tempfile::tempdir().expect("tempdir");
    let artifacts: Arc<dyn ArtifactStore> = Arc::new(FilesystemArtifactStore::new(dir.path(), "results"));
    let queue = InMemoryQueue::new(clock.clone(), Duration::from_secs(300), 5);
    let dyn_store: Arc<dyn JobStore> = store.clone();
    let dyn_queue: Arc<dyn MessageQueue> = queue.clone();
    let progress: Arc<dyn ProgressSink> = Arc::new(ProgressReporter::new(dyn_store.clone(), clock.clone(), 100));
    let mut executor = StageExecutor::new(dyn_store.clone(), artifacts, dyn_queue.clone(), progress, clock.clone(), test_config());
    executor.register(Arc::new(ScriptedStage {
        kind: StageKind::Search,
        outcome: StageOutcome { result_patch: json!({"papers_found": 0}), artifacts: vec![("snowball.json".into(), b"[]".to_vec())], empty: true },
    }));
    let consumer = Consumer::new(dyn_store, dyn_queue.clone(), Arc::new(executor), Arc::new(NoopNotifier), clock.clone(), test_config());

    let job = pipeline_job(&clock);
    let id = job.id;
    store.create(job).await.expect("create");
    queue
        .send(jobctl_core::Message::new(id, JobType::Pipeline, Payload { stage: Some(StageKind::Search), ..Default::default() }))
        .await
        .expect("send");

    let delivery = queue.receive().await.expect("receive").expect("present");
    consumer.handle(delivery).await;

    assert!(queue.receive().await.expect("receive").is_none(), "no ranking message should ever be enqueued");

    let after = store.point_read(&id).await.expect("read").expect("present");
    assert_eq!(after.status, JobStatus::Failed);
    assert_eq!(after.error.as_deref(), Some(jobctl_engine::EMPTY_SEARCH_MESSAGE));
}

#[tokio::test(start_paused = true)]
async fn s3_duplicate_ranking_delivery_is_skipped() {
    let clock = FakeClock::new();
    let harness = build_harness(clock.clone());
    let job = pipeline_job(&clock);
    let id = job.id;
    harness.store.create(job).await.expect("create");

    harness
        .queue
        .send(jobctl_core::Message::new(id, JobType::Pipeline, Payload { stage: Some(StageKind::Search), ..Default::default() }))
        .await
        .expect("send");
    let delivery = harness.queue.receive().await.expect("receive").expect("present");
    harness.consumer.handle(delivery).await;

    let ranking_delivery = harness.queue.receive().await.expect("receive").expect("ranking message present");
    let duplicate = ranking_delivery.clone();
    harness.consumer.handle(ranking_delivery).await;

    let outcome = harness.consumer.handle(duplicate).await;
    assert_eq!(outcome, jobctl_daemon::ConsumerOutcome::SkippedDuplicate);

    drain_queue(&harness).await;
    let after = harness.store.point_read(&id).await.expect("read").expect("present");
    assert_eq!(after.status, JobStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn s4_running_rescue_recovers_crashed_worker() {
    let clock = FakeClock::new();
    let harness = build_harness(clock.clone());
    let mut job = pipeline_job(&clock);
    job.status = JobStatus::Running;
    job.phase = Phase::Ranking;
    job.progress = Progress { steps_completed: 1, steps_total: 3, step_name: "rank".to_string(), message: "ranking in progress".to_string() };
    let id = job.id;
    harness.store.create(job).await.expect("create");

    clock.advance(Duration::from_secs(9 * 60));

    let dyn_store: Arc<dyn JobStore> = harness.store.clone();
    let dyn_queue: Arc<dyn MessageQueue> = harness.queue.clone();
    let watchdog = RunningRescueWatchdog::new(dyn_store, dyn_queue, clock.clone(), test_config());
    watchdog.tick().await;

    let rescued = harness.store.point_read(&id).await.expect("read").expect("present");
    assert!(rescued.progress.is_queued_sentinel());

    drain_queue(&harness).await;
    let after = harness.store.point_read(&id).await.expect("read").expect("present");
    assert_eq!(after.status, JobStatus::Completed);
    assert_eq!(after.phase, Phase::Complete);
}

#[tokio::test(start_paused = true)]
async fn s5_dead_letter_fails_job_and_is_idempotent() {
    let clock = FakeClock::new();
    let store = InMemoryJobStore::new(clock.clone());
    let job = pipeline_job(&clock);
    let id = job.id;
    store.create(job).await.expect("create");

    let processor = DlqProcessor::new(store.clone(), clock, 100);
    let details = DeadLetterDetails {
        reason: Some("MaxDeliveryCountExceeded".to_string()),
        error_description: Some("search backend unreachable".to_string()),
    };

    let first = processor.handle(id, details.clone()).await;
    assert_eq!(first, jobctl_daemon::DlqOutcome::Failed);

    let after = store.point_read(&id).await.expect("read").expect("present");
    assert_eq!(after.status, JobStatus::Failed);
    let error = after.error.expect("error set");
    assert!(error.contains("MaxDeliveryCountExceeded"));
    assert!(error.contains("search backend unreachable"));

    let second = processor.handle(id, details).await;
    assert_eq!(second, jobctl_daemon::DlqOutcome::AlreadyTerminal);
}

#[tokio::test(start_paused = true)]
async fn s6_stale_runaway_fails_with_elapsed_minutes() {
    let clock = FakeClock::new();
    let store = InMemoryJobStore::new(clock.clone());
    let mut job = pipeline_job(&clock);
    job.status = JobStatus::Running;
    job.phase = Phase::Ranking;
    job.progress = Progress { steps_completed: 1, steps_total: 3, step_name: "rank".to_string(), message: "ranking in progress".to_string() };
    let id = job.id;
    store.create(job).await.expect("create");

    clock.advance(Duration::from_secs(31 * 60));

    let dyn_store: Arc<dyn JobStore> = store.clone();
    let watchdog = StaleFailWatchdog::new(dyn_store, clock, test_config());
    watchdog.tick().await;

    let after = store.point_read(&id).await.expect("read").expect("present");
    assert_eq!(after.status, JobStatus::Failed);
    assert!(after.error.expect("error set").contains("31 minute"));
}

