// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion/failure notification seam. The real email transport (Azure
//! Communication Services in the original implementation) is out of
//! scope; this module only defines the trait boundary plus fakes for
//! tests, matching the teacher's adapter-trait pattern for external
//! integrations.

use async_trait::async_trait;
use jobctl_core::JobId;
use parking_lot::Mutex;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_completion(&self, job_id: JobId, recipient: &str);
    async fn send_failure(&self, job_id: JobId, recipient: &str, reason: &str);
}

/// Drops every notification. Used wherever no notification email was
/// configured for a job.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send_completion(&self, _job_id: JobId, _recipient: &str) {}
    async fn send_failure(&self, _job_id: JobId, _recipient: &str, _reason: &str) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Completion { job_id: JobId, recipient: String },
    Failure { job_id: JobId, recipient: String, reason: String },
}

/// Records every notification instead of sending it, for test assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_completion(&self, job_id: JobId, recipient: &str) {
        self.sent.lock().push(Notification::Completion { job_id, recipient: recipient.to_string() });
    }

    async fn send_failure(&self, job_id: JobId, recipient: &str, reason: &str) {
        self.sent.lock().push(Notification::Failure {
            job_id,
            recipient: recipient.to_string(),
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
