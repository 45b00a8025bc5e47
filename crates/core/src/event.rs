// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-job event log: a bounded, append-only audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::job::Phase;

/// The kind of thing that happened to a job. Each variant has a default
/// [`EventLevel`] via [`EventType::default_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    JobCreated,
    JobEnqueued,
    JobEnqueueFailed,
    JobStart,
    StageStarted,
    StageCompleted,
    PhaseStart,
    PhaseComplete,
    PhaseWarning,
    JobCompleted,
    JobFailed,
    DuplicateSkipped,
    StaleDetected,
    QueuedRescue,
    RunningRescue,
    DeadLettered,
    EmailSent,
}

crate::simple_display! {
    EventType {
        JobCreated => "job_created",
        JobEnqueued => "job_enqueued",
        JobEnqueueFailed => "job_enqueue_failed",
        JobStart => "job_start",
        StageStarted => "stage_started",
        StageCompleted => "stage_completed",
        PhaseStart => "phase_start",
        PhaseComplete => "phase_complete",
        PhaseWarning => "phase_warning",
        JobCompleted => "job_completed",
        JobFailed => "job_failed",
        DuplicateSkipped => "duplicate_skipped",
        StaleDetected => "stale_detected",
        QueuedRescue => "queued_rescue",
        RunningRescue => "running_rescue",
        DeadLettered => "dead_lettered",
        EmailSent => "email_sent",
    }
}

impl EventType {
    /// Default severity, mirroring the source's `EVENT_LEVELS` table. Most
    /// lifecycle events are informational; failures and watchdog
    /// interventions are warnings or errors.
    pub fn default_level(self) -> EventLevel {
        match self {
            EventType::JobCreated
            | EventType::JobEnqueued
            | EventType::JobStart
            | EventType::StageStarted
            | EventType::StageCompleted
            | EventType::PhaseStart
            | EventType::PhaseComplete
            | EventType::JobCompleted
            | EventType::EmailSent => EventLevel::Info,
            EventType::DuplicateSkipped
            | EventType::StaleDetected
            | EventType::QueuedRescue
            | EventType::PhaseWarning => EventLevel::Warning,
            EventType::JobFailed
            | EventType::JobEnqueueFailed
            | EventType::RunningRescue
            | EventType::DeadLettered => EventLevel::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

crate::simple_display! {
    EventLevel {
        Info => "info",
        Warning => "warning",
        Error => "error",
    }
}

/// A single entry in a job's bounded event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,
    pub event_type: EventType,
    pub level: EventLevel,
    pub phase: Phase,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

impl Event {
    pub fn new(ts: DateTime<Utc>, event_type: EventType, phase: Phase, message: impl Into<String>) -> Self {
        Self {
            ts,
            level: event_type.default_level(),
            event_type,
            phase,
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn with_level(mut self, level: EventLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Append `event` to `log`, then truncate from the front so `log` never
/// holds more than `max` entries (FIFO drop of the oldest events). Mirrors
/// `config.py::MAX_EVENTS` enforcement in `jobs.py::append_event`.
pub fn append(log: &mut Vec<Event>, event: Event, max: usize) {
    log.push(event);
    if log.len() > max {
        let overflow = log.len() - max;
        log.drain(0..overflow);
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
