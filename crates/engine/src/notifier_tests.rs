// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jobctl_core::JobId;

#[tokio::test]
async fn noop_notifier_drops_everything() {
    let notifier = NoopNotifier;
    notifier.send_completion(JobId::new(), "a@example.com").await;
    notifier.send_failure(JobId::new(), "a@example.com", "boom").await;
}

#[tokio::test]
async fn recording_notifier_captures_completion() {
    let notifier = RecordingNotifier::new();
    let id = JobId::new();
    notifier.send_completion(id, "a@example.com").await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], Notification::Completion { job_id: id, recipient: "a@example.com".to_string() });
}

#[tokio::test]
async fn recording_notifier_captures_failure_with_reason() {
    let notifier = RecordingNotifier::new();
    let id = JobId::new();
    notifier.send_failure(id, "a@example.com", "stale job").await;

    let sent = notifier.sent();
    assert_eq!(
        sent[0],
        Notification::Failure { job_id: id, recipient: "a@example.com".to_string(), reason: "stale job".to_string() }
    );
}

#[tokio::test]
async fn recording_notifier_preserves_order() {
    let notifier = RecordingNotifier::new();
    let a = JobId::new();
    let b = JobId::new();
    notifier.send_completion(a, "a@example.com").await;
    notifier.send_failure(b, "b@example.com", "x").await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(matches!(sent[0], Notification::Completion { .. }));
    assert!(matches!(sent[1], Notification::Failure { .. }));
}
