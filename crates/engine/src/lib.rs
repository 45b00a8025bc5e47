// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobctl-engine: Progress Reporter (C5) and Stage Executor (C6), plus the
//! idempotency gate (spec §5) that guards every stage dispatch.

pub mod error;
pub mod idempotency;
pub mod notifier;
pub mod progress;
pub mod scratch;
pub mod stage;

pub use error::{Result, StageError};
pub use idempotency::{gate, GateDecision};
pub use notifier::{NoopNotifier, Notification, Notifier, RecordingNotifier};
pub use progress::{ProgressReporter, ProgressSink};
pub use scratch::ScratchDir;
pub use stage::{ExecutionOutcome, StageContext, StageExecutor, StageFn, StageOutcome, EMPTY_SEARCH_MESSAGE};
