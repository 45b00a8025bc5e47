// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use jobctl_core::JobId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("stage execution failed: {0}")]
    Failed(String),

    #[error("stage timed out after {0:?}")]
    TimedOut(std::time::Duration),

    #[error(transparent)]
    Storage(#[from] jobctl_storage::Error),

    #[error(transparent)]
    Artifacts(#[from] jobctl_artifacts::Error),

    #[error(transparent)]
    Queue(#[from] jobctl_queue::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StageError>;
