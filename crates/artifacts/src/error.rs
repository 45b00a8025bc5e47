// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use jobctl_core::JobId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("artifact not found for job {job_id}: tried {tried:?}")]
    NotFound { job_id: JobId, tried: Vec<String> },

    #[error("artifact is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
