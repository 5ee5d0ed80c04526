// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-workflow resume checkpoints.
//!
//! A checkpoint carries just enough driver position to resume a paused
//! workflow: the registry file remains the source of truth for lifecycle
//! state. Written with tmp + atomic rename so a crash mid-write never
//! leaves a torn file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Checkpoint errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Snapshot sufficient to resume a paused workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowCheckpoint {
    pub workflow_id: String,
    pub template_path: PathBuf,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub current_step: u32,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub is_paused: bool,
}

impl WorkflowCheckpoint {
    /// Path of the checkpoint file for a workflow id.
    pub fn path(dir: &Path, workflow_id: &str) -> PathBuf {
        dir.join(format!("{workflow_id}.json"))
    }

    /// Write the checkpoint under `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), CheckpointError> {
        std::fs::create_dir_all(dir)?;
        let path = Self::path(dir, &self.workflow_id);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Load a checkpoint if one exists.
    pub fn load(dir: &Path, workflow_id: &str) -> Result<Option<Self>, CheckpointError> {
        let path = Self::path(dir, workflow_id);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Delete a checkpoint. Missing files are fine.
    pub fn remove(dir: &Path, workflow_id: &str) -> Result<(), CheckpointError> {
        match std::fs::remove_file(Self::path(dir, workflow_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
