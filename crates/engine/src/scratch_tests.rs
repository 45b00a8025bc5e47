// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn scratch_dir_exists_while_alive() {
    let scratch = ScratchDir::new("jobctl-test-").expect("create scratch dir");
    assert!(scratch.path().is_dir());
}

#[test]
fn scratch_dir_join_is_inside_path() {
    let scratch = ScratchDir::new("jobctl-test-").expect("create scratch dir");
    let joined = scratch.join("metadata.json");
    assert!(joined.starts_with(scratch.path()));
}

#[test]
fn scratch_dir_is_removed_on_drop() {
    let scratch = ScratchDir::new("jobctl-test-").expect("create scratch dir");
    let path = scratch.path().to_path_buf();
    drop(scratch);
    assert!(!path.exists());
}

#[test]
fn scratch_dir_is_removed_even_after_writes() {
    let scratch = ScratchDir::new("jobctl-test-").expect("create scratch dir");
    let path = scratch.path().to_path_buf();
    std::fs::write(scratch.join("file.txt"), b"data").expect("write");
    drop(scratch);
    assert!(!path.exists());
}
