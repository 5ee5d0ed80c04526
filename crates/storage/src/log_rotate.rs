// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Size/count/age rotation for per-workflow log files.
//!
//! Rotation shifts `{id}.log` → `{id}.log.1` → … → `{id}.log.5`, deleting
//! the oldest, and drops any rotated file older than seven days. All
//! operations are best-effort: a failed rename must never stop a workflow.

use std::path::Path;
use std::time::Duration;

/// Maximum log file size before rotation (50 MiB).
pub const MAX_LOG_SIZE: u64 = 50 * 1024 * 1024;

/// Number of rotated log files to keep.
pub const MAX_ROTATED_LOGS: u32 = 5;

/// Rotated files older than this are deleted.
pub const MAX_ROTATION_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Rotate `log_path` if it exceeds [`MAX_LOG_SIZE`].
///
/// Returns true if a rotation happened.
pub fn rotate_if_needed(log_path: &Path) -> bool {
    rotate_if_larger(log_path, MAX_LOG_SIZE)
}

/// Rotate `log_path` if it exceeds `max_size` (split out for tests).
pub fn rotate_if_larger(log_path: &Path, max_size: u64) -> bool {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return false,
    };
    if size < max_size {
        return false;
    }

    let log_str = log_path.display().to_string();

    // Shift older rotations: .5 is deleted, .4→.5, … .1→.2
    let _ = std::fs::remove_file(format!("{log_str}.{MAX_ROTATED_LOGS}"));
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    // Rotate current log → .1
    std::fs::rename(log_path, format!("{log_str}.1")).is_ok()
}

/// Delete rotated files for `log_path` older than [`MAX_ROTATION_AGE`].
pub fn prune_old_rotations(log_path: &Path) {
    prune_rotations_older_than(log_path, MAX_ROTATION_AGE);
}

/// Delete rotated files older than `max_age` (split out for tests).
pub fn prune_rotations_older_than(log_path: &Path, max_age: Duration) {
    let log_str = log_path.display().to_string();
    for i in 1..=MAX_ROTATED_LOGS {
        let rotated = format!("{log_str}.{i}");
        let stale = std::fs::metadata(&rotated)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|mtime| mtime.elapsed().ok())
            .map(|age| age > max_age)
            .unwrap_or(false);
        if stale {
            let _ = std::fs::remove_file(&rotated);
        }
    }
}

#[cfg(test)]
#[path = "log_rotate_tests.rs"]
mod tests;
