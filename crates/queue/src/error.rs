// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown lock token: {0}")]
    UnknownLockToken(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
