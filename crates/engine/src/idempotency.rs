// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The idempotency gate: decides whether a dispatched message for a given
//! stage should actually run, given the job's current durable state.
//!
//! Grounded on `worker.py::process_job`'s phase-ordering checks and its
//! bounded 2.0s/150ms re-read loop for the "stage ahead by exactly one"
//! case (queue delivery raced the store write that recorded the previous
//! stage's completion).

use std::time::Duration;

use jobctl_core::{Clock, Config, JobId, Phase, StageKind};
use jobctl_storage::JobStore;

use crate::error::{Result, StageError};

/// How many stages `target_stage` is ahead of `phase`, in [`StageKind`]
/// terms. Non-stage phases (`init`, `upload`, `complete`, `error`) have no
/// position in the three-stage ordering; they're treated as arbitrarily far
/// behind so gate logic downstream resolves them as duplicates rather than
/// erroring. Callers special-case `Phase::Init` before reaching here (see
/// [`gate`]), since a freshly created job's first dispatch must proceed
/// rather than fall through this "behind" treatment.
fn phase_distance(target_stage: StageKind, phase: Phase) -> i32 {
    match phase.as_stage() {
        Some(stage) => target_stage.distance_from(stage),
        None => -1,
    }
}

/// Outcome of the gate's decision procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Run the stage now.
    Proceed,
    /// The job already finished (or this exact stage already ran); this is
    /// a duplicate delivery. Acknowledge and drop.
    SkipDuplicate,
    /// The job's phase jumped ahead of this message by more than one
    /// stage; an inconsistent ordering. Acknowledge and drop, logging
    /// loudly.
    SkipAheadTooFar,
}

/// Run the gate's decision procedure for `target_stage` against `job_id`'s
/// current durable state:
///
/// 1. Read the job. Missing job is an error (caller should dead-letter).
/// 2. A job already in a terminal status is always a duplicate.
/// 3. If `target_stage` is behind or equal to the job's current phase and
///    the job is actively `Running` that same phase without being stale,
///    it's a duplicate (another delivery is already processing it, or it
///    already completed that stage).
/// 4. A stale `Running` job (no progress update past
///    `job_stale_minutes`) at the same phase is allowed to retry — the
///    previous attempt is presumed dead.
/// 5. A `Queued` job at the same phase is fresh work: proceed.
/// 6. If `target_stage` is exactly one stage ahead of the job's recorded
///    phase, the store write for the previous stage's completion may not
///    have landed yet (eventual consistency). Re-read in a bounded loop
///    (`idempotency_reread_total`/`idempotency_reread_step`) waiting for
///    the job to catch up.
/// 7. Still ahead by more than zero after the loop, or ahead by more than
///    one stage from the start: skip as an inconsistent jump.
pub async fn gate(
    store: &dyn JobStore,
    job_id: JobId,
    target_stage: StageKind,
    config: &Config,
    clock: &dyn Clock,
) -> Result<GateDecision> {
    let job = store
        .point_read(&job_id)
        .await?
        .ok_or(StageError::JobNotFound(job_id))?;

    if job.status.is_terminal() {
        return Ok(GateDecision::SkipDuplicate);
    }

    // A freshly created job hasn't entered any stage yet; its first
    // dispatch must always proceed rather than being read as "ahead" of
    // phase `init`.
    if job.phase == Phase::Init {
        return Ok(GateDecision::Proceed);
    }

    let distance = phase_distance(target_stage, job.phase);

    if distance <= 0 {
        return Ok(decide_same_or_behind(&job, target_stage, config, clock));
    }

    if distance > 1 {
        return Ok(GateDecision::SkipAheadTooFar);
    }

    // Ahead by exactly one: bounded re-read loop. Attempts are counted
    // rather than wall-clock-deadlined so the loop behaves identically
    // whether driven by a real clock or a paused tokio test clock.
    let step = config.idempotency_reread_step();
    let attempts = (config.idempotency_reread_total().as_millis() / step.as_millis().max(1)).max(1);

    for _ in 0..attempts {
        tokio::time::sleep(step).await;

        let Some(refreshed) = store.point_read(&job_id).await? else {
            return Ok(GateDecision::SkipDuplicate);
        };
        if refreshed.status.is_terminal() {
            return Ok(GateDecision::SkipDuplicate);
        }
        let refreshed_distance = phase_distance(target_stage, refreshed.phase);
        if refreshed_distance <= 0 {
            return Ok(decide_same_or_behind(&refreshed, target_stage, config, clock));
        }
    }

    Ok(GateDecision::SkipAheadTooFar)
}

fn decide_same_or_behind(
    job: &jobctl_core::Job,
    target_stage: StageKind,
    config: &Config,
    clock: &dyn Clock,
) -> GateDecision {
    use jobctl_core::JobStatus;

    if phase_distance(target_stage, job.phase) < 0 {
        return GateDecision::SkipDuplicate;
    }

    match job.status {
        JobStatus::Queued => GateDecision::Proceed,
        JobStatus::Running => {
            if is_stale(job, config, clock) {
                GateDecision::Proceed
            } else {
                GateDecision::SkipDuplicate
            }
        }
        JobStatus::Completed | JobStatus::Failed => GateDecision::SkipDuplicate,
    }
}

fn is_stale(job: &jobctl_core::Job, config: &Config, clock: &dyn Clock) -> bool {
    let now_ms = clock.epoch_ms();
    let updated_ms = job.updated_at.timestamp_millis().max(0) as u64;
    let elapsed = Duration::from_millis(now_ms.saturating_sub(updated_ms));
    elapsed > config.job_stale_threshold()
}

#[cfg(test)]
#[path = "idempotency_tests.rs"]
mod tests;
