// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration, read from environment variables.
//!
//! Names and defaults mirror `config.py` in the original implementation.

use std::time::Duration;

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

/// Every tunable the job-execution substrate reads from its environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Days before a completed/failed job document expires (`JOB_TTL_DAYS`).
    pub job_ttl_days: i64,
    /// Cap on events retained per job's event log (`MAX_JOB_EVENTS`).
    pub max_job_events: usize,
    /// Verbose debug logging toggle (`DEBUG`).
    pub debug: bool,
    /// Base log level for the tracing subscriber (`LOG_LEVEL`).
    pub log_level: String,

    /// Minutes a running job may go without a progress update before the
    /// stale-fail watchdog fails it (`JOB_STALE_MINUTES`).
    pub job_stale_minutes: u64,
    /// Seconds a job may sit queued before the queued-rescue watchdog
    /// re-dispatches it (`JOB_QUEUED_SECONDS`).
    pub job_queued_seconds: u64,
    /// Minutes a running job may go without a progress update, below the
    /// stale-fail threshold, before the running-rescue watchdog re-enqueues
    /// it (`JOB_RUNNING_RESCUE_MINUTES`).
    pub job_running_rescue_minutes: u64,

    /// Seconds the REPORT stage may run before it's treated as timed out
    /// (`REPORT_TIMEOUT_SECONDS`).
    pub report_timeout_seconds: u64,

    /// Artifact store path/name prefix (`RESULTS_PREFIX`).
    pub results_prefix: String,
    /// Filesystem root the reference `ArtifactStore` writes under.
    pub artifact_root: String,

    /// Name of the primary job queue (`QUEUE_NAME`).
    pub queue_name: String,
    /// Suffix appended to `queue_name` for its dead-letter sub-queue.
    pub dlq_suffix: String,
    /// Delivery attempts before a message is moved to the DLQ
    /// (`MAX_DELIVERY_COUNT`).
    pub max_delivery_count: u32,

    /// Total time budget for the idempotency gate's bounded re-read loop,
    /// in milliseconds (default matches spec: ~2s).
    pub idempotency_reread_total_ms: u64,
    /// Sleep between re-read attempts, in milliseconds (default ~150ms).
    pub idempotency_reread_step_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            job_ttl_days: env_i64("JOB_TTL_DAYS", 7),
            max_job_events: env_u64("MAX_JOB_EVENTS", 100) as usize,
            debug: env_bool("DEBUG", false),
            log_level: env_string("LOG_LEVEL", "INFO"),

            job_stale_minutes: env_u64("JOB_STALE_MINUTES", 30),
            job_queued_seconds: env_u64("JOB_QUEUED_SECONDS", 20),
            job_running_rescue_minutes: env_u64("JOB_RUNNING_RESCUE_MINUTES", 8),

            report_timeout_seconds: env_u64("REPORT_TIMEOUT_SECONDS", 1200),

            results_prefix: env_string("RESULTS_PREFIX", "results")
                .trim_matches('/')
                .to_string(),
            artifact_root: env_string("ARTIFACT_ROOT", "./artifacts"),

            queue_name: env_string("QUEUE_NAME", "jobctl-jobs"),
            dlq_suffix: env_string("DLQ_SUFFIX", "-dlq"),
            max_delivery_count: env_u64("MAX_DELIVERY_COUNT", 10) as u32,

            idempotency_reread_total_ms: env_u64("IDEMPOTENCY_REREAD_TOTAL_MS", 2_000),
            idempotency_reread_step_ms: env_u64("IDEMPOTENCY_REREAD_STEP_MS", 150),
        }
    }

    pub fn job_stale_threshold(&self) -> Duration {
        Duration::from_secs(self.job_stale_minutes * 60)
    }

    pub fn job_queued_threshold(&self) -> Duration {
        Duration::from_secs(self.job_queued_seconds)
    }

    pub fn job_running_rescue_threshold(&self) -> Duration {
        Duration::from_secs(self.job_running_rescue_minutes * 60)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_seconds)
    }

    pub fn idempotency_reread_total(&self) -> Duration {
        Duration::from_millis(self.idempotency_reread_total_ms)
    }

    pub fn idempotency_reread_step(&self) -> Duration {
        Duration::from_millis(self.idempotency_reread_step_ms)
    }

    /// Name of the dead-letter sub-queue for the primary job queue.
    pub fn dlq_name(&self) -> String {
        format!("{}{}", self.queue_name, self.dlq_suffix)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
