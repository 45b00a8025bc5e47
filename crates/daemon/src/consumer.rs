// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message Consumer (C7): pulls one delivery off the primary job queue and
//! drives it through the idempotency gate and stage executor.
//!
//! Grounded on `worker.py::process_job_message`: decode, gate, dispatch,
//! notify on a terminal outcome, settle the delivery. A worker exception
//! re-raises in the source so the broker drives redelivery/DLQ; here that
//! becomes `abandon()` rather than `complete()`.

use std::sync::Arc;

use jobctl_core::{Clock, Config, Event, EventType, JobId, JobStatus, Phase, StageKind};
use jobctl_engine::{ExecutionOutcome, GateDecision, Notifier, StageExecutor};
use jobctl_queue::{Delivery, MessageQueue};
use jobctl_storage::JobStore;

/// What became of one delivery after `Consumer::handle` settled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerOutcome {
    /// The target stage ran to completion (success or stage failure).
    Ran,
    /// The idempotency gate judged this a duplicate delivery.
    SkippedDuplicate,
    /// The idempotency gate judged the job's phase inconsistent with the
    /// message's target stage.
    SkippedAheadTooFar,
    /// The delivery referenced a job that no longer exists, or reading it
    /// failed.
    Dropped,
}

pub struct Consumer<C: Clock> {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn MessageQueue>,
    executor: Arc<StageExecutor<C>>,
    notifier: Arc<dyn Notifier>,
    clock: C,
    config: Config,
}

impl<C: Clock> Consumer<C> {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn MessageQueue>,
        executor: Arc<StageExecutor<C>>,
        notifier: Arc<dyn Notifier>,
        clock: C,
        config: Config,
    ) -> Self {
        Self { store, queue, executor, notifier, clock, config }
    }

    pub async fn handle(&self, delivery: Delivery) -> ConsumerOutcome {
        let job_id = delivery.message.job_id;
        let latency_ms = self.clock.epoch_ms().saturating_sub(delivery.enqueued_at_epoch_ms);

        let job = match self.store.point_read(&job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tracing::warn!(job_id = %job_id, "message for unknown job, dropping");
                let _ = self.queue.complete(delivery.lock_token).await;
                return ConsumerOutcome::Dropped;
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "failed to read job, abandoning delivery");
                let _ = self.queue.abandon(delivery.lock_token).await;
                return ConsumerOutcome::Dropped;
            }
        };

        let target_stage = delivery
            .message
            .payload
            .stage
            .or_else(|| job.phase.as_stage())
            .unwrap_or(StageKind::Search);
        tracing::debug!(job_id = %job_id, stage = %target_stage, latency_ms, "dispatching job message");

        match self.executor.execute(job_id, target_stage).await {
            Ok(ExecutionOutcome::Ran) => {
                let _ = self.queue.complete(delivery.lock_token).await;
                self.notify_if_terminal(job_id).await;
                ConsumerOutcome::Ran
            }
            Ok(ExecutionOutcome::Skipped(decision)) => {
                let _ = self.queue.complete(delivery.lock_token).await;
                match decision {
                    GateDecision::Proceed => ConsumerOutcome::Ran,
                    GateDecision::SkipDuplicate => ConsumerOutcome::SkippedDuplicate,
                    GateDecision::SkipAheadTooFar => ConsumerOutcome::SkippedAheadTooFar,
                }
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, stage = %target_stage, error = %e, "stage execution failed");
                self.notify_if_terminal(job_id).await;
                let _ = self.queue.abandon(delivery.lock_token).await;
                ConsumerOutcome::Ran
            }
        }
    }

    /// Send a completion/failure email exactly once per terminal
    /// transition, reading the job back so we notify with its final state.
    async fn notify_if_terminal(&self, job_id: JobId) {
        let Ok(Some(job)) = self.store.point_read(&job_id).await else {
            return;
        };
        let Some(recipient) = job.payload.notification_email.as_deref() else {
            return;
        };
        let sent = match job.status {
            JobStatus::Completed => {
                self.notifier.send_completion(job_id, recipient).await;
                true
            }
            JobStatus::Failed => {
                let reason = job.error.as_deref().unwrap_or("unknown error");
                self.notifier.send_failure(job_id, recipient, reason).await;
                true
            }
            JobStatus::Queued | JobStatus::Running => false,
        };
        if sent {
            let event = Event::new(chrono::Utc::now(), EventType::EmailSent, job.phase, format!("notified {recipient}"));
            if let Err(e) = self.store.append_event(&job_id, event, self.config.max_job_events).await {
                tracing::warn!(job_id = %job_id, error = %e, "failed to append email_sent event");
            }
        }
    }
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
