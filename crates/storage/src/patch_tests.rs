// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use jobctl_core::{JobId, JobType, Payload, Phase};
use serde_json::json;

fn job() -> Job {
    Job::new(JobId::new(), JobType::Pipeline, "q", Payload::default(), Utc::now(), 7)
}

#[test]
fn set_status_applies() {
    let mut j = job();
    PatchOp::SetStatus(JobStatus::Running).apply(&mut j);
    assert_eq!(j.status, JobStatus::Running);
}

#[test]
fn set_phase_applies() {
    let mut j = job();
    PatchOp::SetPhase(Phase::Ranking).apply(&mut j);
    assert_eq!(j.phase, Phase::Ranking);
}

#[test]
fn merge_result_merges_not_replaces() {
    let mut j = job();
    PatchOp::MergeResult(json!({"a": 1})).apply(&mut j);
    PatchOp::MergeResult(json!({"b": 2})).apply(&mut j);
    assert_eq!(j.result, json!({"a": 1, "b": 2}));
}

#[test]
fn increment_delivery_count_is_cumulative() {
    let mut j = job();
    PatchOp::IncrementDeliveryCount.apply(&mut j);
    PatchOp::IncrementDeliveryCount.apply(&mut j);
    assert_eq!(j.delivery_count, 2);
}

#[test]
fn advance_sets_status_and_phase_together() {
    let mut j = job();
    PatchOp::Advance { status: JobStatus::Running, phase: Phase::Report }.apply(&mut j);
    assert_eq!(j.status, JobStatus::Running);
    assert_eq!(j.phase, Phase::Report);
}

#[test]
fn applying_same_op_twice_is_idempotent() {
    let mut j1 = job();
    let mut j2 = job();
    let op = PatchOp::SetStatus(JobStatus::Completed);
    op.apply(&mut j1);
    op.apply(&mut j1);
    op.apply(&mut j2);
    assert_eq!(j1.status, j2.status);
}
