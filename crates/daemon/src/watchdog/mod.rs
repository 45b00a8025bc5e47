// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watchdog Controllers (C9): three independent periodic timers that
//! rescue or fail jobs the normal consumer path missed, grounded on
//! `watchdog.py`'s three functions. Their threshold windows are strictly
//! disjoint (§4.9.4); see `jobctl_core::config_tests::watchdog_windows_are_disjoint`.

use std::time::Duration;

use async_trait::async_trait;

pub mod queued_rescue;
pub mod running_rescue;
pub mod scheduler;
pub mod stale_fail;

pub use queued_rescue::QueuedRescueWatchdog;
pub use running_rescue::RunningRescueWatchdog;
pub use scheduler::WatchdogScheduler;
pub use stale_fail::StaleFailWatchdog;

/// A periodic reconciliation pass over the job store.
#[async_trait]
pub trait Watchdog: Send + Sync {
    fn name(&self) -> &'static str;
    fn period(&self) -> Duration;
    async fn tick(&self);
}
