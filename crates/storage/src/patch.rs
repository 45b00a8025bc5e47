// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed patch operations applied to a [`Job`] document.
//!
//! The reference `JobStore` applies these directly to the in-memory struct.
//! A real Cosmos-like backend would translate each op into a JSON-patch
//! path write; keeping them typed here means callers (the progress
//! reporter, stage executor, watchdogs) never hand-roll JSON pointers for
//! the fields they actually touch.

use jobctl_core::{Job, JobStatus, Phase, Progress};
use serde_json::Value;

/// A single field-level update to apply to a job document. Application is
/// idempotent: applying the same op twice in a row leaves the document in
/// the same state as applying it once (invariant I7).
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    SetStatus(JobStatus),
    SetPhase(Phase),
    SetProgress(Progress),
    MergeResult(Value),
    SetError(Option<String>),
    IncrementDeliveryCount,
    /// Transition status and phase together, as the executor does when a
    /// stage hands off to the next one or a job finishes.
    Advance { status: JobStatus, phase: Phase },
}

impl PatchOp {
    pub fn apply(&self, job: &mut Job) {
        match self {
            PatchOp::SetStatus(status) => job.status = *status,
            PatchOp::SetPhase(phase) => job.phase = *phase,
            PatchOp::SetProgress(progress) => job.progress = progress.clone(),
            PatchOp::MergeResult(patch) => job.merge_result(patch.clone()),
            PatchOp::SetError(error) => job.error = error.clone(),
            PatchOp::IncrementDeliveryCount => job.delivery_count += 1,
            PatchOp::Advance { status, phase } => {
                job.status = *status;
                job.phase = *phase;
            }
        }
    }
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
