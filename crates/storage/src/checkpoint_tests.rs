// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn checkpoint(id: &str) -> WorkflowCheckpoint {
    WorkflowCheckpoint {
        workflow_id: id.to_string(),
        template_path: PathBuf::from("/templates/fix_bug.json"),
        branch: "main".to_string(),
        current_step: 3,
        total_steps: 7,
        is_paused: true,
    }
}

#[test]
fn save_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let original = checkpoint("wf_1_2");
    original.save(dir.path()).unwrap();

    let loaded = WorkflowCheckpoint::load(dir.path(), "wf_1_2")
        .unwrap()
        .unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn load_missing_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(WorkflowCheckpoint::load(dir.path(), "absent")
        .unwrap()
        .is_none());
}

#[test]
fn save_creates_directory_and_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("workflows").join("checkpoints");

    let mut cp = checkpoint("wf_1_2");
    cp.save(&nested).unwrap();
    cp.current_step = 5;
    cp.save(&nested).unwrap();

    let loaded = WorkflowCheckpoint::load(&nested, "wf_1_2").unwrap().unwrap();
    assert_eq!(loaded.current_step, 5);
    // No stray tmp file left behind.
    assert!(!WorkflowCheckpoint::path(&nested, "wf_1_2")
        .with_extension("tmp")
        .exists());
}

#[test]
fn remove_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    checkpoint("wf_1_2").save(dir.path()).unwrap();
    WorkflowCheckpoint::remove(dir.path(), "wf_1_2").unwrap();
    assert!(WorkflowCheckpoint::load(dir.path(), "wf_1_2")
        .unwrap()
        .is_none());
    WorkflowCheckpoint::remove(dir.path(), "wf_1_2").unwrap();
}

#[test]
fn corrupt_checkpoint_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(WorkflowCheckpoint::path(dir.path(), "bad"), "{not json").unwrap();
    assert!(WorkflowCheckpoint::load(dir.path(), "bad").is_err());
}
