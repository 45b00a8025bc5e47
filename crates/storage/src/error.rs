// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use jobctl_core::JobId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("job not found: {0}")]
    NotFound(JobId),

    #[error("job already exists: {0}")]
    AlreadyExists(JobId),

    #[error("patch failed for {job_id}: {reason}")]
    PatchFailed { job_id: JobId, reason: String },

    #[error(transparent)]
    Core(#[from] jobctl_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
