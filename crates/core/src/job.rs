// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle types: identity, status, phase, progress, and payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::stage::StageKind;

crate::define_id! {
    /// Identifies a research-report job across its entire lifecycle.
    pub struct JobId { prefix: "job-" }
}

/// Which terminal shape a job's pipeline takes. `Pipeline` runs all three
/// stages through to REPORT; `Search` stops after SEARCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Pipeline,
    Search,
}

crate::simple_display! {
    JobType {
        Pipeline => "pipeline",
        Search => "search",
    }
}

impl JobType {
    /// The stage whose successful completion ends this job type's
    /// pipeline.
    pub fn terminal_stage(self) -> StageKind {
        match self {
            JobType::Pipeline => StageKind::Report,
            JobType::Search => StageKind::Search,
        }
    }
}

/// A job's broader lifecycle phase, spanning both pipeline bookends
/// (`init`, `complete`, `error`) and the work stages themselves.
///
/// `init → search → ranking → report → complete` for pipeline jobs,
/// `init → search → complete` for search jobs, modulo a detour to `error`.
/// `upload` brackets the artifact-persist step that follows a stage's
/// algorithm and precedes handoff or completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Search,
    Ranking,
    Report,
    Upload,
    Complete,
    Error,
}

crate::simple_display! {
    Phase {
        Init => "init",
        Search => "search",
        Ranking => "ranking",
        Report => "report",
        Upload => "upload",
        Complete => "complete",
        Error => "error",
    }
}

impl Phase {
    /// The executable stage this phase corresponds to, if any. `Init`,
    /// `Upload`, `Complete`, and `Error` are bookend phases with no
    /// registered [`crate::stage::StageKind`] of their own.
    pub fn as_stage(self) -> Option<StageKind> {
        match self {
            Phase::Search => Some(StageKind::Search),
            Phase::Ranking => Some(StageKind::Rank),
            Phase::Report => Some(StageKind::Report),
            Phase::Init | Phase::Upload | Phase::Complete | Phase::Error => None,
        }
    }
}

impl From<StageKind> for Phase {
    fn from(stage: StageKind) -> Self {
        match stage {
            StageKind::Search => Phase::Search,
            StageKind::Rank => Phase::Ranking,
            StageKind::Report => Phase::Report,
        }
    }
}

/// Overall lifecycle status of a job. Distinct from `Phase`, which tracks
/// *where in the pipeline* a running job is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

impl JobStatus {
    /// Terminal statuses never transition further (invariant I1: terminal
    /// stickiness).
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Stage-specific request parameters, opaque to the job-execution substrate.
///
/// `stage` names the single stage to run when a job targets one stage
/// directly (used by watchdog-driven re-dispatch); `None` means "run the
/// full pipeline starting at SEARCH". `params` carries whatever the stage
/// itself needs (`num_results`, `k_factor`, `pairing`, `report_top_k`, ...)
/// without this crate needing to know their shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_email: Option<String>,
    #[serde(default)]
    pub params: Value,
}

/// The literal sentinel `step_name` a freshly created job carries until a
/// worker claims it. Also checked as a case-insensitive substring of
/// `message` per the queued-rescue watchdog's broader match.
pub const QUEUED_STEP_SENTINEL: &str = "Queued";

/// Progress snapshot surfaced to clients polling a job's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub steps_completed: u32,
    pub steps_total: u32,
    pub step_name: String,
    pub message: String,
}

impl Progress {
    pub fn queued() -> Self {
        Self {
            steps_completed: 0,
            steps_total: 3,
            step_name: QUEUED_STEP_SENTINEL.to_string(),
            message: "Job queued".to_string(),
        }
    }

    /// True if this progress snapshot still reflects the queued sentinel,
    /// per the GLOSSARY's "queued" definition: `step_name == "Queued"` OR
    /// `message` contains `"queued"` (case-insensitive).
    pub fn is_queued_sentinel(&self) -> bool {
        self.step_name == QUEUED_STEP_SENTINEL
            || self.message.to_lowercase().contains("queued")
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::queued()
    }
}

/// A durable job document: the unit of state the Job Store persists and the
/// watchdogs/consumers operate on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub query: String,
    pub status: JobStatus,
    pub phase: Phase,
    pub progress: Progress,
    pub payload: Payload,
    #[serde(default)]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: i64,
    #[serde(default)]
    pub delivery_count: u32,
}

impl Job {
    pub fn new(
        id: JobId,
        job_type: JobType,
        query: impl Into<String>,
        payload: Payload,
        now: DateTime<Utc>,
        ttl_days: i64,
    ) -> Self {
        Self {
            id,
            job_type,
            query: query.into(),
            status: JobStatus::Queued,
            phase: Phase::Init,
            progress: Progress::queued(),
            payload,
            result: Value::Object(Map::new()),
            error: None,
            created_at: now,
            updated_at: now,
            expires_at: (now + chrono::Duration::days(ttl_days)).timestamp(),
            delivery_count: 0,
        }
    }

    /// Merge `patch` into `result` field-by-field (last write wins per key),
    /// matching the source's `result_state.update(...)` pattern rather than
    /// wholesale replacement.
    pub fn merge_result(&mut self, patch: Value) {
        match (&mut self.result, patch) {
            (Value::Object(existing), Value::Object(incoming)) => {
                for (k, v) in incoming {
                    existing.insert(k, v);
                }
            }
            (slot, patch) => *slot = patch,
        }
    }

    pub fn mark_running(&mut self, phase: Phase, now: DateTime<Utc>) {
        self.status = JobStatus::Running;
        self.phase = phase;
        self.updated_at = now;
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.phase = Phase::Complete;
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.updated_at = now;
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
