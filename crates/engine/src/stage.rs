// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage Executor (C6): runs one pipeline stage end-to-end — gate check,
//! scratch directory, artifact download/upload, result merge, and handoff
//! to the next stage (or job completion).
//!
//! Grounded on `pipeline.py::run_pipeline`/`run_ranking_stage` for the
//! overall shape (scratch workspace, metadata rewrite, upload, cleanup)
//! and `worker.py::process_job` for the gate-then-dispatch sequencing.
//! The SEARCH/RANK/REPORT algorithms themselves are out of scope; this
//! module only wires whatever [`StageFn`] implementation is registered for
//! each [`StageKind`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jobctl_artifacts::ArtifactStore;
use jobctl_core::{Clock, Config, EventType, Job, JobId, JobStatus, Message, Payload, Phase, StageKind};
use jobctl_queue::MessageQueue;
use jobctl_storage::{JobStore, PatchOp};
use serde_json::Value;

use crate::error::{Result, StageError};
use crate::idempotency::{self, GateDecision};
use crate::progress::ProgressSink;
use crate::scratch::ScratchDir;

/// Canonical artifact filenames the executor itself (not the stage
/// algorithm) knows how to fetch and rewrite.
const SNOWBALL_FILENAME: &str = "snowball.json";
const METADATA_FILENAME: &str = "metadata.json";

/// The well-known failure message for the empty-search short-circuit
/// (scenario S2): SEARCH produced no candidates, so RANK/REPORT would have
/// nothing to work with.
pub const EMPTY_SEARCH_MESSAGE: &str = "Search produced 0 papers; cannot continue to ranking/report.";

/// Everything a [`StageFn`] needs to do its work: job identity, request
/// parameters, and an isolated scratch directory for downloaded inputs and
/// generated outputs.
pub struct StageContext {
    pub job_id: JobId,
    pub query: String,
    pub payload: Payload,
    pub scratch: ScratchDir,
}

/// What a stage produced: a partial result to merge into the job document
/// and artifact bytes to upload under the job's namespace.
#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    pub result_patch: Value,
    pub artifacts: Vec<(String, Vec<u8>)>,
    /// SEARCH-only: true if the search returned zero results, short-
    /// circuiting RANK/REPORT straight to job failure (scenario S2).
    pub empty: bool,
}

/// One pipeline stage's algorithm. Implementations live outside this crate
/// (SEARCH/RANK/REPORT internals are out of scope here); this crate only
/// defines the seam and drives it.
#[async_trait]
pub trait StageFn: Send + Sync {
    fn kind(&self) -> StageKind;
    async fn run(&self, ctx: &mut StageContext, progress: &dyn ProgressSink) -> Result<StageOutcome>;
}

/// Drives a single stage invocation through gate-check, execution, and
/// handoff.
pub struct StageExecutor<C: Clock> {
    store: Arc<dyn JobStore>,
    artifacts: Arc<dyn ArtifactStore>,
    queue: Arc<dyn MessageQueue>,
    progress: Arc<dyn ProgressSink>,
    clock: C,
    config: Config,
    stages: HashMap<StageKind, Arc<dyn StageFn>>,
}

/// What happened as a result of running (or skipping) a dispatched stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The stage ran and the job either handed off to the next stage or
    /// completed.
    Ran,
    /// The idempotency gate determined this was a duplicate or
    /// inconsistent dispatch; nothing was executed.
    Skipped(GateDecision),
}

impl<C: Clock> StageExecutor<C> {
    pub fn new(
        store: Arc<dyn JobStore>,
        artifacts: Arc<dyn ArtifactStore>,
        queue: Arc<dyn MessageQueue>,
        progress: Arc<dyn ProgressSink>,
        clock: C,
        config: Config,
    ) -> Self {
        Self { store, artifacts, queue, progress, clock, config, stages: HashMap::new() }
    }

    pub fn register(&mut self, stage: Arc<dyn StageFn>) {
        self.stages.insert(stage.kind(), stage);
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.clock.epoch_ms() as i64)
            .unwrap_or_else(chrono::Utc::now)
    }

    pub async fn execute(&self, job_id: JobId, target_stage: StageKind) -> Result<ExecutionOutcome> {
        let decision = idempotency::gate(self.store.as_ref(), job_id, target_stage, &self.config, &self.clock).await?;
        if decision != GateDecision::Proceed {
            tracing::info!(job_id = %job_id, stage = %target_stage, ?decision, "idempotency gate skipped dispatch");
            self.progress
                .append_event(job_id, EventType::DuplicateSkipped, Phase::from(target_stage), "skipped by idempotency gate")
                .await;
            return Ok(ExecutionOutcome::Skipped(decision));
        }

        let job = self
            .store
            .point_read(&job_id)
            .await?
            .ok_or(StageError::JobNotFound(job_id))?;

        self.store
            .patch(&job_id, &[PatchOp::Advance { status: JobStatus::Running, phase: Phase::from(target_stage) }])
            .await?;
        self.progress
            .append_event(job_id, EventType::StageStarted, Phase::from(target_stage), &format!("starting {target_stage}"))
            .await;

        let stage_fn = self
            .stages
            .get(&target_stage)
            .cloned()
            .ok_or_else(|| StageError::Failed(format!("no stage implementation registered for {target_stage}")))?;

        let scratch = ScratchDir::new("jobctl-stage-")?;
        self.download_prerequisites(job_id, target_stage, &scratch).await?;
        let mut ctx = StageContext { job_id, query: job.query.clone(), payload: job.payload.clone(), scratch };

        let outcome = if target_stage == StageKind::Report {
            match tokio::time::timeout(self.config.report_timeout(), stage_fn.run(&mut ctx, self.progress.as_ref())).await {
                Ok(result) => result,
                Err(_) => Err(StageError::TimedOut(self.config.report_timeout())),
            }
        } else {
            stage_fn.run(&mut ctx, self.progress.as_ref()).await
        };

        match outcome {
            Ok(outcome) => {
                self.handle_success(&job, target_stage, outcome).await?;
                Ok(ExecutionOutcome::Ran)
            }
            Err(e) => {
                self.handle_failure(job_id, target_stage, &e).await;
                Err(e)
            }
        }
    }

    /// Fetch whatever artifacts `target_stage` needs as inputs, per the
    /// stage-dependency table (SEARCH has none; RANK needs the search
    /// output; REPORT needs the search output plus the most recently
    /// ranked list named in the metadata index).
    async fn download_prerequisites(&self, job_id: JobId, target_stage: StageKind, scratch: &ScratchDir) -> Result<()> {
        match target_stage {
            StageKind::Search => Ok(()),
            StageKind::Rank => {
                self.artifacts.download(&job_id, SNOWBALL_FILENAME, &scratch.join(SNOWBALL_FILENAME)).await?;
                Ok(())
            }
            StageKind::Report => {
                self.artifacts.download(&job_id, SNOWBALL_FILENAME, &scratch.join(SNOWBALL_FILENAME)).await?;
                let metadata = self.artifacts.get_json(&job_id, METADATA_FILENAME).await?;
                if let Some(name) = latest_ranked_filename(&metadata) {
                    self.artifacts.download(&job_id, &name, &scratch.join(&name)).await?;
                }
                Ok(())
            }
        }
    }

    async fn handle_success(&self, job: &Job, stage: StageKind, outcome: StageOutcome) -> Result<()> {
        let job_id = job.id;
        for (name, bytes) in &outcome.artifacts {
            self.artifacts.put(&job_id, name, bytes, content_type_for(name)).await?;
        }
        if !outcome.artifacts.is_empty() {
            self.update_metadata(job, &outcome).await?;
        }
        self.store.patch(&job_id, &[PatchOp::MergeResult(outcome.result_patch)]).await?;
        self.progress
            .append_event(job_id, EventType::PhaseComplete, Phase::from(stage), &format!("completed {stage}"))
            .await;

        if outcome.empty && stage.is_first() {
            self.store
                .patch(
                    &job_id,
                    &[PatchOp::Advance { status: JobStatus::Failed, phase: Phase::Error }, PatchOp::SetError(Some(EMPTY_SEARCH_MESSAGE.to_string()))],
                )
                .await?;
            self.progress
                .append_event(job_id, EventType::JobFailed, Phase::Error, EMPTY_SEARCH_MESSAGE)
                .await;
            return Ok(());
        }

        if stage == job.job_type.terminal_stage() {
            self.store
                .patch(&job_id, &[PatchOp::Advance { status: JobStatus::Completed, phase: Phase::Complete }])
                .await?;
            self.progress
                .append_event(job_id, EventType::JobCompleted, Phase::Complete, "job completed")
                .await;
            return Ok(());
        }

        if let Some(next) = stage.next() {
            // Progress first, enqueue second: a consumer picking up the
            // handoff message must never observe a document still showing
            // the previous phase.
            self.store
                .patch(&job_id, &[PatchOp::Advance { status: JobStatus::Queued, phase: Phase::from(next) }])
                .await?;
            let message = Message::new(
                job_id,
                job.job_type,
                Payload {
                    stage: Some(next),
                    notification_email: job.payload.notification_email.clone(),
                    params: job.payload.params.clone(),
                },
            );
            self.queue.send(message).await?;
        }
        Ok(())
    }

    /// Rewrite the per-query metadata index to include this stage's output
    /// filenames, merging with whatever the index already held so earlier
    /// stages' entries survive.
    async fn update_metadata(&self, job: &Job, outcome: &StageOutcome) -> Result<()> {
        let mut metadata = self.artifacts.get_json(&job.id, METADATA_FILENAME).await.unwrap_or_else(|_| Value::Object(Default::default()));
        let now = self.now().to_rfc3339();

        let map = match &mut metadata {
            Value::Object(map) => map,
            other => {
                *other = Value::Object(Default::default());
                other.as_object_mut().expect("just assigned an object")
            }
        };

        map.entry("query".to_string()).or_insert_with(|| Value::String(job.query.clone()));
        map.entry("created_at".to_string()).or_insert_with(|| Value::String(now.clone()));
        map.insert("last_updated".to_string(), Value::String(now));

        let mut filenames: Vec<String> = map
            .get("filenames")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        for (name, _) in &outcome.artifacts {
            if !filenames.contains(name) {
                filenames.push(name.clone());
            }
        }
        map.insert("filenames".to_string(), Value::Array(filenames.into_iter().map(Value::String).collect()));

        let bytes = serde_json::to_vec_pretty(&metadata)?;
        self.artifacts.put(&job.id, METADATA_FILENAME, &bytes, "application/json").await?;
        Ok(())
    }

    async fn handle_failure(&self, job_id: JobId, stage: StageKind, error: &StageError) {
        let message = error.to_string();
        if let Err(e) = self
            .store
            .patch(&job_id, &[PatchOp::Advance { status: JobStatus::Failed, phase: Phase::Error }, PatchOp::SetError(Some(message.clone()))])
            .await
        {
            tracing::error!(job_id = %job_id, error = %e, "failed to persist job failure");
        }
        self.progress.append_event(job_id, EventType::JobFailed, Phase::Error, &message).await;
    }
}

/// Infer an artifact's MIME type from its filename, per the JSON/HTML/
/// plain-text artifact taxonomy.
fn content_type_for(filename: &str) -> &'static str {
    if filename.ends_with(".json") {
        "application/json"
    } else if filename.ends_with(".html") {
        "text/html"
    } else {
        "text/plain"
    }
}

/// The most recently recorded `elo_ranked_*.json` filename in a metadata
/// index, if any. Entries are appended in completion order, so the last
/// matching filename is the most recent.
fn latest_ranked_filename(metadata: &Value) -> Option<String> {
    metadata
        .get("filenames")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(Value::as_str)
        .filter(|name| name.starts_with("elo_ranked"))
        .last()
        .map(str::to_string)
}

/// Returns the job as currently stored, for callers (e.g. the REPORT
/// timeout watcher) that need to inspect state without driving execution.
pub async fn read_job(store: &dyn JobStore, job_id: JobId) -> Result<Job> {
    store.point_read(&job_id).await?.ok_or(StageError::JobNotFound(job_id))
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
