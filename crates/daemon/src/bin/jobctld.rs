// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jobctld: the worker process. Consumes job messages off the primary
//! queue, drains its dead-letter sub-queue, and runs the three watchdog
//! controllers, all against the in-process reference backends.
//!
//! SEARCH/RANK/REPORT stage algorithms are out of scope; no [`StageFn`] is
//! registered here, so a real deployment embeds this binary's wiring with
//! its own stage implementations registered on the [`StageExecutor`]
//! before the consumer loop starts.

use std::sync::Arc;
use std::time::Duration;

use jobctl_artifacts::{ArtifactStore, FilesystemArtifactStore};
use jobctl_core::{Config, SystemClock};
use jobctl_daemon::{
    drain_once, Consumer, DlqProcessor, QueuedRescueWatchdog, RunningRescueWatchdog, StaleFailWatchdog,
    WatchdogScheduler,
};
use jobctl_engine::{NoopNotifier, ProgressReporter, ProgressSink, StageExecutor};
use jobctl_queue::{InMemoryQueue, MessageQueue};
use jobctl_storage::{InMemoryJobStore, JobStore};
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;

/// How long a delivery stays locked before it's eligible for redelivery.
/// Not spec-named; chosen to comfortably exceed a single stage dispatch.
const VISIBILITY_TIMEOUT: Duration = Duration::from_secs(300);

/// Poll interval for draining the dead-letter sub-queue.
const DLQ_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    init_logging(&config);

    tracing::info!(
        queue = %config.queue_name,
        dlq = %config.dlq_name(),
        "starting jobctld"
    );

    let clock = SystemClock;
    let store: Arc<dyn JobStore> = InMemoryJobStore::new(clock);
    let artifacts: Arc<dyn ArtifactStore> =
        Arc::new(FilesystemArtifactStore::new(config.artifact_root.clone(), config.results_prefix.clone()));
    artifacts.ensure_container().await?;

    let queue = InMemoryQueue::new(clock, VISIBILITY_TIMEOUT, config.max_delivery_count);
    let dyn_queue: Arc<dyn MessageQueue> = queue.clone();
    let dlq = queue.dead_letter_queue();

    let progress: Arc<dyn ProgressSink> =
        Arc::new(ProgressReporter::new(store.clone(), clock, config.max_job_events));
    let executor = Arc::new(StageExecutor::new(
        store.clone(),
        artifacts.clone(),
        dyn_queue.clone(),
        progress,
        clock,
        config.clone(),
    ));

    let consumer = Arc::new(Consumer::new(
        store.clone(),
        dyn_queue.clone(),
        executor.clone(),
        Arc::new(NoopNotifier),
        clock,
        config.clone(),
    ));
    let dlq_processor = Arc::new(DlqProcessor::new(store.clone(), clock, config.max_job_events));

    let mut scheduler = WatchdogScheduler::new();
    scheduler.spawn(Arc::new(StaleFailWatchdog::new(store.clone(), clock, config.clone())));
    scheduler.spawn(Arc::new(QueuedRescueWatchdog::new(store.clone(), executor, clock, config.clone())));
    scheduler.spawn(Arc::new(RunningRescueWatchdog::new(store.clone(), dyn_queue.clone(), clock, config.clone())));

    let consumer_handle = tokio::spawn(consumer_loop(consumer, dyn_queue));
    let dlq_handle = tokio::spawn(dlq_loop(dlq, dlq_processor));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
    }

    consumer_handle.abort();
    dlq_handle.abort();
    scheduler.shutdown();
    tracing::info!("jobctld stopped");
    Ok(())
}

/// Pulls deliveries off the primary queue one at a time, idling briefly
/// whenever it finds nothing ready.
async fn consumer_loop<C: jobctl_core::Clock>(consumer: Arc<Consumer<C>>, queue: Arc<dyn MessageQueue>) {
    loop {
        match queue.receive().await {
            Ok(Some(delivery)) => {
                let outcome = consumer.handle(delivery).await;
                tracing::debug!(?outcome, "delivery settled");
            }
            Ok(None) => tokio::time::sleep(Duration::from_millis(200)).await,
            Err(e) => {
                tracing::warn!(error = %e, "failed to receive from queue");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Periodically drains the dead-letter sub-queue.
async fn dlq_loop<C: jobctl_core::Clock>(dlq: Arc<jobctl_queue::DlqQueue>, processor: Arc<DlqProcessor<C>>) {
    let mut interval = tokio::time::interval(DLQ_POLL_INTERVAL);
    loop {
        interval.tick().await;
        let handled = drain_once(&dlq, &processor).await;
        if handled > 0 {
            tracing::info!(handled, "drained dead-letter queue");
        }
    }
}

fn init_logging(config: &Config) {
    let default_level = if config.debug { "debug" } else { config.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
