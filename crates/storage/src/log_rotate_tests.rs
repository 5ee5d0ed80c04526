// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn small_file_is_not_rotated() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("wf.log");
    std::fs::write(&log, "short").unwrap();
    assert!(!rotate_if_larger(&log, 1024));
    assert!(log.exists());
}

#[test]
fn missing_file_is_not_rotated() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!rotate_if_larger(&dir.path().join("absent.log"), 1));
}

#[test]
fn oversized_file_shifts_into_rotation_slot() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("wf.log");
    std::fs::write(&log, vec![b'x'; 64]).unwrap();

    assert!(rotate_if_larger(&log, 64));
    assert!(!log.exists());
    let rotated = dir.path().join("wf.log.1");
    assert_eq!(std::fs::metadata(&rotated).unwrap().len(), 64);
}

#[test]
fn rotation_keeps_bounded_history() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("wf.log");

    // Rotate more times than the retention window.
    for generation in 0..(MAX_ROTATED_LOGS + 2) {
        std::fs::write(&log, format!("gen-{generation:03}").repeat(10)).unwrap();
        assert!(rotate_if_larger(&log, 1));
    }

    // Exactly MAX_ROTATED_LOGS files survive, newest in .1.
    for i in 1..=MAX_ROTATED_LOGS {
        assert!(dir.path().join(format!("wf.log.{i}")).exists(), "missing .{i}");
    }
    assert!(!dir.path().join(format!("wf.log.{}", MAX_ROTATED_LOGS + 1)).exists());

    let newest = std::fs::read_to_string(dir.path().join("wf.log.1")).unwrap();
    assert!(newest.starts_with(&format!("gen-{:03}", MAX_ROTATED_LOGS + 1)));
}

#[test]
fn prune_deletes_only_stale_rotations() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("wf.log");
    std::fs::write(dir.path().join("wf.log.1"), "recent").unwrap();
    std::fs::write(dir.path().join("wf.log.2"), "recent").unwrap();

    // Nothing is older than zero-age threshold's complement: with a huge
    // max_age, everything survives.
    prune_rotations_older_than(&log, Duration::from_secs(3600));
    assert!(dir.path().join("wf.log.1").exists());
    assert!(dir.path().join("wf.log.2").exists());

    // With a zero max_age, freshly written files are already "stale".
    prune_rotations_older_than(&log, Duration::ZERO);
    assert!(!dir.path().join("wf.log.1").exists());
    assert!(!dir.path().join("wf.log.2").exists());
}
