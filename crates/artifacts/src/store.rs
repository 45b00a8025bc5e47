// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Artifact Store contract (C2) and its filesystem reference
//! implementation.
//!
//! Grounded on `results.py`: `results_path` for layout,
//! `_blob_name_variants`/`get_blob_json`/`download_blob_to_path` for
//! prefix-drift-tolerant lookup.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jobctl_core::{artifact, JobId};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Contract for where stage outputs (search results, ranked lists, metadata,
/// generated reports) live.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `bytes` under this job's artifact namespace as `filename`,
    /// tagged with `content_type` (`application/json`, `text/html`,
    /// `text/plain`). Always overwrites.
    async fn put(&self, job_id: &JobId, filename: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Read and parse a JSON artifact, tolerating prefix drift.
    async fn get_json(&self, job_id: &JobId, filename: &str) -> Result<Value>;

    /// Copy an artifact to a local filesystem path (e.g. into a stage's
    /// scratch directory), tolerating prefix drift.
    async fn download(&self, job_id: &JobId, filename: &str, dest: &Path) -> Result<()>;

    /// List artifact names under a job's namespace.
    async fn list(&self, job_id: &JobId) -> Result<Vec<String>>;

    /// Ensure the backing container/directory exists.
    async fn ensure_container(&self) -> Result<()>;

    /// Cheap best-effort reachability probe, mirroring
    /// `jobs.py::test_cosmos_connection`'s sibling checks for blob storage.
    async fn health_check(&self) -> Result<()> {
        self.ensure_container().await
    }
}

/// Filesystem-backed `ArtifactStore`, rooted at `root` with artifacts laid
/// out as `{root}/{prefix}/{job_id}/{filename}`.
pub struct FilesystemArtifactStore {
    root: PathBuf,
    prefix: String,
}

impl FilesystemArtifactStore {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    fn candidate_paths(&self, job_id: &JobId, filename: &str) -> Vec<PathBuf> {
        let canonical = artifact::results_path(&self.prefix, job_id, filename);
        artifact::blob_name_variants(&canonical, &self.prefix)
            .into_iter()
            .map(|name| self.root.join(name))
            .collect()
    }

    async fn read_with_variants(&self, job_id: &JobId, filename: &str) -> Result<Vec<u8>> {
        let candidates = self.candidate_paths(job_id, filename);
        let mut tried = Vec::with_capacity(candidates.len());
        for path in &candidates {
            match tokio::fs::read(path).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tried.push(path.display().to_string());
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Err(Error::NotFound { job_id: *job_id, tried })
    }
}

#[async_trait]
impl ArtifactStore for FilesystemArtifactStore {
    async fn put(&self, job_id: &JobId, filename: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let path = self.root.join(artifact::results_path(&self.prefix, job_id, filename));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        let digest = Sha256::digest(bytes);
        tracing::info!(
            job_id = %job_id,
            filename,
            content_type,
            sha256 = %hex_encode(&digest),
            bytes = bytes.len(),
            "artifact written"
        );
        Ok(())
    }

    async fn get_json(&self, job_id: &JobId, filename: &str) -> Result<Value> {
        let bytes = self.read_with_variants(job_id, filename).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn download(&self, job_id: &JobId, filename: &str, dest: &Path) -> Result<()> {
        let bytes = self.read_with_variants(job_id, filename).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, bytes).await?;
        Ok(())
    }

    async fn list(&self, job_id: &JobId) -> Result<Vec<String>> {
        let dir = self.root.join(&self.prefix).join(job_id.to_string());
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(Error::Io(e)),
        };
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn ensure_container(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{:02x}", b);
        s
    })
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
