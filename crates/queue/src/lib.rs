// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobctl-queue: the Message Queue contract (C3) and its dead-letter
//! sub-queue (feeding C8).

pub mod error;
pub mod queue;

pub use error::{Error, Result};
pub use queue::{Delivery, DlqQueue, InMemoryQueue, LockToken, MessageQueue};
