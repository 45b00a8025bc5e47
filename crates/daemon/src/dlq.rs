// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DLQ Processor (C8): drains the dead-letter sub-queue and fails the
//! corresponding job document.
//!
//! Grounded on `worker.py::process_deadletter_message` and
//! `_mark_job_failed_from_dlq`: compose `"Job dead-lettered: <reason>.
//! <description>"`, transition to `failed`, and preserve the dead-letter
//! fields on the event record.

use std::sync::Arc;

use jobctl_core::{DeadLetterDetails, Event, EventType, JobId};
use jobctl_queue::DlqQueue;
use jobctl_storage::{JobStore, PatchOp};

/// What became of one dead-lettered entry after `DlqProcessor::handle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DlqOutcome {
    /// The job was found, non-terminal, and failed.
    Failed,
    /// The job no longer exists.
    JobMissing,
    /// The job had already reached a terminal status; nothing to do.
    AlreadyTerminal,
}

pub struct DlqProcessor<C: jobctl_core::Clock> {
    store: Arc<dyn JobStore>,
    clock: C,
    max_events: usize,
}

impl<C: jobctl_core::Clock> DlqProcessor<C> {
    pub fn new(store: Arc<dyn JobStore>, clock: C, max_events: usize) -> Self {
        Self { store, clock, max_events }
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.clock.epoch_ms() as i64).unwrap_or_else(chrono::Utc::now)
    }

    pub async fn handle(&self, job_id: JobId, details: DeadLetterDetails) -> DlqOutcome {
        let job = match self.store.point_read(&job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tracing::warn!(job_id = %job_id, "dead-lettered message for unknown job, dropping");
                return DlqOutcome::JobMissing;
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "failed to read job for dead-letter processing");
                return DlqOutcome::JobMissing;
            }
        };

        if job.status.is_terminal() {
            tracing::info!(job_id = %job_id, status = %job.status, "dead-lettered job already terminal, dropping");
            return DlqOutcome::AlreadyTerminal;
        }

        let reason = details.reason.clone().unwrap_or_else(|| "unknown".to_string());
        let description = details.error_description.clone().unwrap_or_default();
        let message = format!("Job dead-lettered: {reason}. {description}");

        if let Err(e) = self
            .store
            .patch(&job_id, &[PatchOp::SetStatus(jobctl_core::JobStatus::Failed), PatchOp::SetError(Some(message.clone()))])
            .await
        {
            tracing::error!(job_id = %job_id, error = %e, "failed to persist dead-letter failure");
            return DlqOutcome::JobMissing;
        }

        let event = Event::new(self.now(), EventType::DeadLettered, job.phase, &message)
            .with_field("reason", reason)
            .with_field("error_description", description);
        if let Err(e) = self.store.append_event(&job_id, event, self.max_events).await {
            tracing::warn!(job_id = %job_id, error = %e, "failed to append dead-letter event");
        }

        DlqOutcome::Failed
    }
}

/// Drains `dlq` one entry at a time, handing each to `processor`. Intended
/// to be driven in a loop by the daemon binary; a single pass is exposed
/// here so callers (and tests) control their own polling cadence.
pub async fn drain_once<C: jobctl_core::Clock>(dlq: &DlqQueue, processor: &DlqProcessor<C>) -> usize {
    let mut handled = 0;
    while let Some((message, details)) = dlq.pop() {
        processor.handle(message.job_id, details).await;
        handled += 1;
    }
    handled
}

#[cfg(test)]
#[path = "dlq_tests.rs"]
mod tests;
