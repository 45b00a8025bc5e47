// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crate-wide error type for `jobctl-core`.

use thiserror::Error;

/// Errors raised while constructing or validating core domain types.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid phase transition: {from} -> {to}")]
    InvalidPhaseTransition { from: String, to: String },

    #[error("invalid job status {0:?}")]
    InvalidJobStatus(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
