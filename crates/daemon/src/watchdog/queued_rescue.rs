// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queued-rescue watchdog (C9.2): re-dispatches jobs that have sat queued
//! (or running but still carrying the Queued sentinel) for longer than
//! `JOB_QUEUED_SECONDS`. Processes at most one job per tick to bound
//! invocation overrun risk.
//!
//! Grounded on `watchdog.py::queued_job_watchdog`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobctl_core::{Clock, Config, Event, EventType, Job, JobStatus, Phase, Progress, StageKind};
use jobctl_engine::StageExecutor;
use jobctl_storage::{JobStore, PatchOp};

use super::Watchdog;

/// Resolve the stage a queued-rescue dispatch should run, per the
/// phase-to-stage fallback rule: a job still at `init` hasn't been claimed
/// by any worker yet, so it starts at SEARCH; a job already inside one of
/// the three executable stages resumes there; anything else (upload,
/// complete, error) isn't a rescuable phase.
fn resolve_stage(phase: Phase) -> Option<StageKind> {
    match phase {
        Phase::Init => Some(StageKind::Search),
        other => other.as_stage(),
    }
}

pub struct QueuedRescueWatchdog<C: Clock> {
    store: Arc<dyn JobStore>,
    executor: Arc<StageExecutor<C>>,
    clock: C,
    config: Config,
}

impl<C: Clock> QueuedRescueWatchdog<C> {
    pub fn new(store: Arc<dyn JobStore>, executor: Arc<StageExecutor<C>>, clock: C, config: Config) -> Self {
        Self { store, executor, clock, config }
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.clock.epoch_ms() as i64).unwrap_or_else(chrono::Utc::now)
    }

    fn is_candidate(job: &Job) -> bool {
        match job.status {
            JobStatus::Queued => true,
            JobStatus::Running => job.progress.is_queued_sentinel(),
            JobStatus::Completed | JobStatus::Failed => false,
        }
    }
}

#[async_trait]
impl<C: Clock> Watchdog for QueuedRescueWatchdog<C> {
    fn name(&self) -> &'static str {
        "queued_rescue"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(10)
    }

    async fn tick(&self) {
        let mut candidates = match self.store.query(&Self::is_candidate).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!(error = %e, "queued-rescue watchdog: failed to query candidates");
                return;
            }
        };

        let now_ms = self.clock.epoch_ms();
        let threshold_ms = self.config.job_queued_threshold().as_millis() as u64;
        candidates.retain(|job| {
            let updated_ms = job.updated_at.timestamp_millis().max(0) as u64;
            now_ms.saturating_sub(updated_ms) >= threshold_ms
        });
        candidates.sort_by_key(|job| job.updated_at);

        let Some((job, stage)) = candidates.into_iter().find_map(|job| resolve_stage(job.phase).map(|stage| (job, stage))) else {
            return;
        };

        let waited_ms = now_ms.saturating_sub(job.updated_at.timestamp_millis().max(0) as u64);
        let message = format!("Rescue watchdog running {stage} stage (queued {}s)", waited_ms / 1000);
        tracing::info!(job_id = %job.id, stage = %stage, waited_secs = waited_ms / 1000, "queued-rescue watchdog dispatching job");

        let progress = Progress { steps_completed: stage.index() as u32, steps_total: 3, step_name: stage.to_string(), message: message.clone() };
        if let Err(e) = self.store.patch(&job.id, &[PatchOp::SetProgress(progress)]).await {
            tracing::warn!(job_id = %job.id, error = %e, "queued-rescue watchdog: failed to set progress");
        }

        let event = Event::new(self.now(), EventType::QueuedRescue, Phase::from(stage), &message);
        if let Err(e) = self.store.append_event(&job.id, event, self.config.max_job_events).await {
            tracing::warn!(job_id = %job.id, error = %e, "queued-rescue watchdog: failed to append event");
        }

        if let Err(e) = self.executor.execute(job.id, stage).await {
            tracing::warn!(job_id = %job.id, stage = %stage, error = %e, "queued-rescue watchdog: stage execution failed");
        }
    }
}

#[cfg(test)]
#[path = "queued_rescue_tests.rs"]
mod tests;
