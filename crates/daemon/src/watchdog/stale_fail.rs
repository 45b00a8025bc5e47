// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stale-fail watchdog (C9.1): fails any `running` job that has gone
//! quiet for longer than `JOB_STALE_MINUTES`.
//!
//! Grounded on `watchdog.py::stale_job_watchdog`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobctl_core::{Clock, Config, Event, EventType, JobStatus};
use jobctl_storage::{JobStore, PatchOp};

use super::Watchdog;

pub struct StaleFailWatchdog<C: Clock> {
    store: Arc<dyn JobStore>,
    clock: C,
    config: Config,
}

impl<C: Clock> StaleFailWatchdog<C> {
    pub fn new(store: Arc<dyn JobStore>, clock: C, config: Config) -> Self {
        Self { store, clock, config }
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.clock.epoch_ms() as i64).unwrap_or_else(chrono::Utc::now)
    }
}

#[async_trait]
impl<C: Clock> Watchdog for StaleFailWatchdog<C> {
    fn name(&self) -> &'static str {
        "stale_fail"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(5 * 60)
    }

    async fn tick(&self) {
        let running = match self.store.query(&|job| job.status == JobStatus::Running).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!(error = %e, "stale-fail watchdog: failed to query running jobs");
                return;
            }
        };

        let now_ms = self.clock.epoch_ms();
        let threshold = self.config.job_stale_threshold();

        for job in running {
            let updated_ms = job.updated_at.timestamp_millis().max(0) as u64;
            let elapsed = Duration::from_millis(now_ms.saturating_sub(updated_ms));
            if elapsed <= threshold {
                continue;
            }

            let minutes = elapsed.as_secs() / 60;
            let message = format!("job has been running for {minutes} minute(s) without a progress update");
            tracing::warn!(job_id = %job.id, minutes, "stale-fail watchdog failing job");

            if let Err(e) = self
                .store
                .patch(&job.id, &[PatchOp::SetStatus(JobStatus::Failed), PatchOp::SetError(Some(message.clone()))])
                .await
            {
                tracing::error!(job_id = %job.id, error = %e, "stale-fail watchdog: failed to patch job");
                continue;
            }

            let event = Event::new(self.now(), EventType::StaleDetected, job.phase, &message);
            if let Err(e) = self.store.append_event(&job.id, event, self.config.max_job_events).await {
                tracing::warn!(job_id = %job.id, error = %e, "stale-fail watchdog: failed to append event");
            }
        }
    }
}

#[cfg(test)]
#[path = "stale_fail_tests.rs"]
mod tests;
