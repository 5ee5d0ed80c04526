// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor spawning.
//!
//! Children are fully detached from the daemon's terminal and session:
//! stdin is null, stdout+stderr append to the per-workflow log, and the
//! child gets its own process group so pause/abandon signals reach the
//! whole executor tree without touching the daemon.

use crate::error::EngineError;
use argo_core::WorkflowEntry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::reaper::ReaperHandle;

/// Static spawn configuration shared by every executor.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Path to the `argo-exec` binary.
    pub executor_bin: PathBuf,
    /// Directory holding per-workflow log files.
    pub log_dir: PathBuf,
    /// Base URL executors use to reach the daemon.
    pub daemon_url: String,
    /// State root forwarded as `ARGO_ROOT` so executors keep their
    /// checkpoints under the daemon's tree.
    pub argo_root: PathBuf,
}

/// Per-workflow spawn parameters, retained for retry respawns.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub template_path: PathBuf,
    pub args: Vec<String>,
    /// Pre-validated environment overrides.
    pub env: HashMap<String, String>,
}

/// Seam between the lifecycle manager and actual process creation.
#[async_trait]
pub trait Spawner: Send + Sync {
    /// Spawn an executor for `entry`; returns the child pid.
    async fn spawn(&self, entry: &WorkflowEntry, spec: &SpawnSpec) -> Result<u32, EngineError>;
}

/// Production spawner: `tokio::process` + log redirection + pgid
/// isolation, with the child registered at the reaper.
pub struct ExecutorSpawner {
    config: SpawnConfig,
    reaper: ReaperHandle,
}

impl ExecutorSpawner {
    pub fn new(config: SpawnConfig, reaper: ReaperHandle) -> Self {
        Self { config, reaper }
    }

    fn log_path(&self, workflow_id: &str) -> PathBuf {
        self.config.log_dir.join(format!("{workflow_id}.log"))
    }
}

#[async_trait]
impl Spawner for ExecutorSpawner {
    async fn spawn(&self, entry: &WorkflowEntry, spec: &SpawnSpec) -> Result<u32, EngineError> {
        std::fs::create_dir_all(&self.config.log_dir)?;
        let log_path = self.log_path(&entry.id);
        argo_storage::log_rotate::rotate_if_needed(&log_path);

        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        let log_err = log.try_clone()?;

        let mut cmd = Command::new(&self.config.executor_bin);
        cmd.args(&spec.args)
            .env_clear()
            .envs(&spec.env)
            .env("ARGO_WORKFLOW_ID", &entry.id)
            .env("ARGO_TEMPLATE_PATH", &spec.template_path)
            .env("ARGO_BRANCH", &entry.active_branch)
            .env("ARGO_ENVIRONMENT", &entry.environment)
            .env("ARGO_DAEMON_URL", &self.config.daemon_url)
            .env("ARGO_ROOT", &self.config.argo_root)
            .env("ARGO_LOG_PATH", &log_path)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .process_group(0)
            .kill_on_drop(false);

        // HOME passes through when present; executors resolve their own
        // state paths from it.
        if let Ok(home) = std::env::var("HOME") {
            cmd.env("HOME", home);
        }

        debug!(
            workflow_id = %entry.id,
            executor = %self.config.executor_bin.display(),
            template = %spec.template_path.display(),
            "spawning executor"
        );

        let child = cmd
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("{}: {e}", entry.id)))?;
        let pid = child
            .id()
            .ok_or_else(|| EngineError::Spawn(format!("{}: no pid", entry.id)))?;

        self.reaper.watch(pid, child);
        info!(workflow_id = %entry.id, pid, "executor spawned");
        Ok(pid)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{EngineError, SpawnSpec, Spawner};
    use argo_core::WorkflowEntry;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Scripted spawner: hands out sequential fake pids, records spawns,
    /// and can be told to fail.
    #[derive(Clone, Default)]
    pub struct FakeSpawner {
        inner: Arc<Mutex<FakeInner>>,
    }

    #[derive(Default)]
    struct FakeInner {
        next_pid: u32,
        fail: bool,
        spawned: Vec<(String, SpawnSpec)>,
    }

    impl FakeSpawner {
        pub fn new() -> Self {
            let fake = Self::default();
            fake.inner.lock().next_pid = 1000;
            fake
        }

        pub fn fail_next(&self, fail: bool) {
            self.inner.lock().fail = fail;
        }

        pub fn spawned(&self) -> Vec<(String, SpawnSpec)> {
            self.inner.lock().spawned.clone()
        }

        pub fn spawn_count(&self) -> usize {
            self.inner.lock().spawned.len()
        }
    }

    #[async_trait]
    impl Spawner for FakeSpawner {
        async fn spawn(
            &self,
            entry: &WorkflowEntry,
            spec: &SpawnSpec,
        ) -> Result<u32, EngineError> {
            let mut inner = self.inner.lock();
            if inner.fail {
                return Err(EngineError::Spawn(format!("{}: scripted failure", entry.id)));
            }
            inner.next_pid += 1;
            let pid = inner.next_pid;
            inner.spawned.push((entry.id.clone(), spec.clone()));
            Ok(pid)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSpawner;

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
