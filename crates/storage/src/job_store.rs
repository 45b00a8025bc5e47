// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job Store contract (C1) and its in-memory reference implementation.
//!
//! Grounded on `jobs.py::create_job`/`get_job`/`update_job_document` for the
//! contract shape, and on the teacher's `MaterializedState::apply_event`
//! (assignment not mutation, existence-check guards, status-check guards)
//! for how patches must behave idempotently and never resurrect a
//! terminal job.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jobctl_core::{Clock, Event, Job, JobId};
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::patch::PatchOp;

/// Contract for the durable job document store (C1) and its embedded event
/// log (C4).
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a brand-new job document. Errors if one already exists with
    /// the same id.
    async fn create(&self, job: Job) -> Result<()>;

    /// Read a job document by id, if it exists.
    async fn point_read(&self, id: &JobId) -> Result<Option<Job>>;

    /// Read every job document matching `predicate`. The reference store
    /// scans its full in-memory snapshot; a real backend would translate
    /// `predicate` into a query filter.
    async fn query(&self, predicate: &(dyn Fn(&Job) -> bool + Send + Sync)) -> Result<Vec<Job>>;

    /// Apply a batch of field-level patches to a job document, guarding
    /// against mutating a job that is already in a terminal status
    /// (invariant I1: terminal stickiness). Always bumps `updated_at`.
    /// Returns the document after the patch (whether or not it changed).
    async fn patch(&self, id: &JobId, ops: &[PatchOp]) -> Result<Job>;

    /// Append an event to a job's bounded event log.
    async fn append_event(&self, id: &JobId, event: Event, max: usize) -> Result<()>;

    /// Read a job's full event log.
    async fn events(&self, id: &JobId) -> Result<Vec<Event>>;

    /// The field a partition-key-aware backend would discover and use for
    /// point reads. The reference store is always keyed by `job_id`
    /// directly; this exists so callers can log/diagnose what a production
    /// backend would report, per the partition-key-discovery contract.
    fn partition_key_field(&self) -> &'static str {
        "job_id"
    }

    /// Cheap best-effort reachability probe, mirroring
    /// `jobs.py::test_cosmos_connection`. The reference store is always
    /// reachable.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

struct Entry {
    job: Job,
    events: Vec<Event>,
}

/// In-memory `JobStore`, backed by a lock-guarded hash map. Suitable as the
/// single source of truth for tests and for a single-process deployment;
/// a production backend would swap this for a Cosmos-like document store
/// without changing any caller.
pub struct InMemoryJobStore<C: Clock> {
    clock: C,
    jobs: RwLock<HashMap<JobId, Entry>>,
}

impl<C: Clock> InMemoryJobStore<C> {
    pub fn new(clock: C) -> Arc<Self> {
        Arc::new(Self {
            clock,
            jobs: RwLock::new(HashMap::new()),
        })
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.clock.epoch_ms() as i64)
            .unwrap_or_else(chrono::Utc::now)
    }
}

#[async_trait]
impl<C: Clock + 'static> JobStore for InMemoryJobStore<C> {
    async fn create(&self, job: Job) -> Result<()> {
        let mut jobs = self.jobs.write();
        if jobs.contains_key(&job.id) {
            return Err(Error::AlreadyExists(job.id));
        }
        let id = job.id;
        jobs.insert(id, Entry { job, events: Vec::new() });
        tracing::info!(job_id = %id, "job created");
        Ok(())
    }

    async fn point_read(&self, id: &JobId) -> Result<Option<Job>> {
        Ok(self.jobs.read().get(id).map(|e| e.job.clone()))
    }

    async fn query(&self, predicate: &(dyn Fn(&Job) -> bool + Send + Sync)) -> Result<Vec<Job>> {
        Ok(self
            .jobs
            .read()
            .values()
            .map(|e| &e.job)
            .filter(|job| predicate(job))
            .cloned()
            .collect())
    }

    async fn patch(&self, id: &JobId, ops: &[PatchOp]) -> Result<Job> {
        let mut jobs = self.jobs.write();
        let entry = jobs.get_mut(id).ok_or(Error::NotFound(*id))?;

        if entry.job.status.is_terminal() {
            tracing::warn!(job_id = %id, status = %entry.job.status, "ignoring patch on terminal job");
            return Ok(entry.job.clone());
        }

        for op in ops {
            op.apply(&mut entry.job);
        }
        entry.job.updated_at = self.now();
        Ok(entry.job.clone())
    }

    async fn append_event(&self, id: &JobId, event: Event, max: usize) -> Result<()> {
        let mut jobs = self.jobs.write();
        let entry = jobs.get_mut(id).ok_or(Error::NotFound(*id))?;
        jobctl_core::append_event(&mut entry.events, event, max);
        Ok(())
    }

    async fn events(&self, id: &JobId) -> Result<Vec<Event>> {
        Ok(self
            .jobs
            .read()
            .get(id)
            .map(|e| e.events.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "job_store_tests.rs"]
mod tests;
