// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact naming: slugs, path layout, and prefix-drift-tolerant lookup.

use crate::job::JobId;

/// Slugify a free-text query into a filesystem/URL-safe token, matching
/// `utils.py::slugify` exactly: lowercase, strip everything that isn't a
/// word character/space/hyphen, collapse runs of hyphens/spaces into a
/// single underscore, trim leading/trailing underscores, cap at 100 chars.
pub fn slugify(query: &str) -> String {
    let lower = query.to_lowercase();
    let stripped: String = lower
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_' || *c == '-')
        .collect();

    let mut slug = String::with_capacity(stripped.len());
    let mut in_run = false;
    for c in stripped.chars() {
        if c == '-' || c.is_whitespace() {
            if !in_run {
                slug.push('_');
                in_run = true;
            }
        } else {
            slug.push(c);
            in_run = false;
        }
    }

    let trimmed = slug.trim_matches('_');
    let truncated: String = trimmed.chars().take(100).collect();
    truncated
}

/// Canonical artifact path for a job's output under the configured
/// `artifact_root`/`prefix`: `{prefix}/{job_id}/{filename}`.
pub fn results_path(prefix: &str, job_id: &JobId, filename: &str) -> String {
    format!("{}/{}/{}", prefix.trim_matches('/'), job_id, filename)
}

/// Candidate blob/file names to try when looking up an artifact whose
/// prefix may have drifted across redeploys (the configured prefix changed,
/// or an artifact was written before a prefix was introduced). Mirrors
/// `results.py::_blob_name_variants`'s four candidates, deduplicated while
/// preserving order:
///
/// 1. `name` unchanged
/// 2. `{prefix}/{name}` (prefix prepended)
/// 3. `name` with a leading `{prefix}/` stripped
/// 4. `name` with a leading slash stripped
pub fn blob_name_variants(name: &str, prefix: &str) -> Vec<String> {
    let prefix = prefix.trim_matches('/');
    let mut candidates = vec![
        name.to_string(),
        format!("{}/{}", prefix, name),
        name.strip_prefix(&format!("{}/", prefix))
            .unwrap_or(name)
            .to_string(),
        name.strip_prefix('/').unwrap_or(name).to_string(),
    ];

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.clone()));
    candidates
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
