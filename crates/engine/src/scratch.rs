// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scratch directory RAII guard for stage execution.
//!
//! Grounded on `pipeline.py::run_pipeline`'s `tempfile.mkdtemp()` +
//! `try/finally: shutil.rmtree(workspace)` pattern: every stage gets an
//! isolated working directory that is guaranteed to be cleaned up no
//! matter which exit path the stage takes (success, error, or panic
//! unwind during a test).

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// An isolated, auto-cleaned working directory for one stage invocation.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new(prefix: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

#[cfg(test)]
#[path = "scratch_tests.rs"]
mod tests;
