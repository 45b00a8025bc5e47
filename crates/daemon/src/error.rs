// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] jobctl_storage::Error),

    #[error(transparent)]
    Queue(#[from] jobctl_queue::Error),

    #[error(transparent)]
    Artifacts(#[from] jobctl_artifacts::Error),

    #[error(transparent)]
    Stage(#[from] jobctl_engine::StageError),
}

pub type Result<T> = std::result::Result<T, Error>;
