// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress Reporter (C5): best-effort progress/event updates a running
//! stage pushes back to the job document.
//!
//! Grounded on `jobs.py::append_job_event`/`update_job_progress`: both are
//! explicitly best-effort — a failure to persist a progress update must
//! never fail the stage itself, only get logged.

use std::sync::Arc;

use async_trait::async_trait;
use jobctl_core::{Clock, Event, EventType, JobId, Phase, Progress};
use jobctl_storage::{JobStore, PatchOp};

/// The narrow capability a [`crate::stage::StageFn`] needs to report
/// progress, separate from the full [`ProgressReporter`] so stage fakes in
/// tests don't need to construct a whole reporter.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn update_progress(&self, job_id: JobId, progress: Progress);
    async fn append_event(&self, job_id: JobId, event_type: EventType, phase: Phase, message: &str);
}

pub struct ProgressReporter<C: Clock> {
    store: Arc<dyn JobStore>,
    clock: C,
    max_events: usize,
}

impl<C: Clock> ProgressReporter<C> {
    pub fn new(store: Arc<dyn JobStore>, clock: C, max_events: usize) -> Self {
        Self { store, clock, max_events }
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.clock.epoch_ms() as i64)
            .unwrap_or_else(chrono::Utc::now)
    }
}

#[async_trait]
impl<C: Clock> ProgressSink for ProgressReporter<C> {
    async fn update_progress(&self, job_id: JobId, progress: Progress) {
        let result = self
            .store
            .patch(&job_id, &[PatchOp::SetProgress(progress)])
            .await;
        if let Err(e) = result {
            tracing::warn!(job_id = %job_id, error = %e, "failed to persist progress update");
        }
    }

    async fn append_event(&self, job_id: JobId, event_type: EventType, phase: Phase, message: &str) {
        let event = Event::new(self.now(), event_type, phase, message);
        let level = event.level;
        if let Err(e) = self.store.append_event(&job_id, event, self.max_events).await {
            tracing::warn!(job_id = %job_id, error = %e, "failed to append job event");
            return;
        }
        match level {
            jobctl_core::EventLevel::Info => {
                tracing::info!(job_id = %job_id, event_type = %event_type, message)
            }
            jobctl_core::EventLevel::Warning => {
                tracing::warn!(job_id = %job_id, event_type = %event_type, message)
            }
            jobctl_core::EventLevel::Error => {
                tracing::error!(job_id = %job_id, event_type = %event_type, message)
            }
        }
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
