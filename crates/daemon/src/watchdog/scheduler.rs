// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives each registered [`Watchdog`] on its own `tokio::time::interval`
//! task, matching the teacher's one-timer-per-concern scheduling idiom.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::Watchdog;

#[derive(Default)]
pub struct WatchdogScheduler {
    handles: Vec<JoinHandle<()>>,
}

impl WatchdogScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task that ticks `watchdog` on its own period until the
    /// scheduler is shut down. The first interval tick fires immediately
    /// and is skipped so a freshly started daemon doesn't race its own
    /// warm-up.
    pub fn spawn(&mut self, watchdog: Arc<dyn Watchdog>) {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(watchdog.period());
            interval.tick().await;
            loop {
                interval.tick().await;
                watchdog.tick().await;
            }
        });
        self.handles.push(handle);
    }

    /// Abort every spawned watchdog task.
    pub fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}
