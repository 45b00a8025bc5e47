// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Running-rescue watchdog (C9.3): re-enqueues jobs that are `running` but
//! have gone quiet for at least `JOB_RUNNING_RESCUE_MINUTES`, short of the
//! stale-fail threshold. A soft rescue — it never flips a job to `failed`
//! itself; that remains the stale-fail watchdog's job.
//!
//! Grounded on `watchdog.py::running_job_rescue_watchdog`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobctl_core::{Clock, Config, Event, EventType, JobStatus, Message, Phase, Progress, QUEUED_STEP_SENTINEL};
use jobctl_queue::MessageQueue;
use jobctl_storage::{JobStore, PatchOp};

use super::Watchdog;

pub struct RunningRescueWatchdog<C: Clock> {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn MessageQueue>,
    clock: C,
    config: Config,
}

impl<C: Clock> RunningRescueWatchdog<C> {
    pub fn new(store: Arc<dyn JobStore>, queue: Arc<dyn MessageQueue>, clock: C, config: Config) -> Self {
        Self { store, queue, clock, config }
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.clock.epoch_ms() as i64).unwrap_or_else(chrono::Utc::now)
    }
}

#[async_trait]
impl<C: Clock> Watchdog for RunningRescueWatchdog<C> {
    fn name(&self) -> &'static str {
        "running_rescue"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(60)
    }

    async fn tick(&self) {
        let running = match self.store.query(&|job| job.status == JobStatus::Running).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!(error = %e, "running-rescue watchdog: failed to query jobs");
                return;
            }
        };

        let now_ms = self.clock.epoch_ms();
        let lower = self.config.job_running_rescue_threshold();
        let upper = self.config.job_stale_threshold();

        for job in running {
            if job.progress.is_queued_sentinel() {
                continue;
            }
            let updated_ms = job.updated_at.timestamp_millis().max(0) as u64;
            let elapsed = Duration::from_millis(now_ms.saturating_sub(updated_ms));
            if elapsed < lower || elapsed >= upper {
                continue;
            }

            let Some(stage) = job.phase.as_stage() else {
                tracing::warn!(job_id = %job.id, phase = %job.phase, "running-rescue watchdog: job running at a non-stage phase, skipping");
                continue;
            };
            tracing::info!(job_id = %job.id, stage = %stage, elapsed_secs = elapsed.as_secs(), "running-rescue watchdog re-enqueuing job");

            let mut payload = job.payload.clone();
            payload.stage = Some(stage);
            if let Err(e) = self.queue.send(Message::new(job.id, job.job_type, payload)).await {
                tracing::warn!(job_id = %job.id, error = %e, "running-rescue watchdog: re-enqueue failed, leaving job running");
                continue;
            }

            let message = format!("Rescue watchdog re-enqueued {stage} stage");
            let progress = Progress { steps_completed: stage.index() as u32, steps_total: 3, step_name: QUEUED_STEP_SENTINEL.to_string(), message: message.clone() };
            if let Err(e) = self.store.patch(&job.id, &[PatchOp::SetProgress(progress)]).await {
                tracing::warn!(job_id = %job.id, error = %e, "running-rescue watchdog: failed to set progress");
            }

            let event = Event::new(self.now(), EventType::RunningRescue, Phase::from(stage), &message);
            if let Err(e) = self.store.append_event(&job.id, event, self.config.max_job_events).await {
                tracing::warn!(job_id = %job.id, error = %e, "running-rescue watchdog: failed to append event");
            }
        }
    }
}

#[cfg(test)]
#[path = "running_rescue_tests.rs"]
mod tests;
