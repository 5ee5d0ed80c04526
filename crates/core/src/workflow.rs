// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow registry record and state machine.

use crate::clock::Clock;
use crate::limits::MAX_ENVIRONMENT_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a workflow through its lifecycle.
///
/// ```text
/// PENDING ─spawn-ok→ RUNNING ─SIGUSR1→ PAUSED ─SIGUSR2→ RUNNING
///                      │                  │
///                      │                  ├─SIGTERM→ ABANDONED
///                      ├─exit 0───────────┴─→ COMPLETED
///                      ├─exit !=0, retries-left → PENDING (backoff)
///                      ├─exit !=0, retries=0 → FAILED
///                      └─timeout (124) → FAILED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Abandoned,
}

impl WorkflowState {
    /// Terminal states never transition again (except removal).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Completed | WorkflowState::Failed | WorkflowState::Abandoned
        )
    }

    /// Whether the state machine permits `self → to`.
    pub fn can_transition(&self, to: WorkflowState) -> bool {
        use WorkflowState::*;
        match (self, to) {
            // Spawn outcome, or abandon before the child ever ran.
            (Pending, Running) | (Pending, Failed) | (Pending, Abandoned) => true,
            // Exit, pause, abandon, or retry back to pending.
            (Running, Paused)
            | (Running, Completed)
            | (Running, Failed)
            | (Running, Abandoned)
            | (Running, Pending) => true,
            // A paused executor can still exit, be abandoned, or resume.
            (Paused, Running) | (Paused, Completed) | (Paused, Failed) | (Paused, Abandoned) => {
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::Pending => write!(f, "pending"),
            WorkflowState::Running => write!(f, "running"),
            WorkflowState::Paused => write!(f, "paused"),
            WorkflowState::Completed => write!(f, "completed"),
            WorkflowState::Failed => write!(f, "failed"),
            WorkflowState::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Configuration for creating a new workflow entry
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub id: String,
    pub template_name: String,
    pub instance_name: String,
    pub active_branch: String,
    pub environment: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

impl WorkflowConfig {
    pub fn new(id: impl Into<String>, template_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            template_name: template_name.into(),
            instance_name: String::new(),
            active_branch: String::new(),
            environment: String::new(),
            timeout_seconds: 0,
            max_retries: 0,
        }
    }

    pub fn instance(mut self, name: impl Into<String>) -> Self {
        self.instance_name = name.into();
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.active_branch = branch.into();
        self
    }

    pub fn environment(mut self, env: impl Into<String>) -> Self {
        let mut env = env.into();
        env.truncate(MAX_ENVIRONMENT_LEN);
        self.environment = env;
        self
    }

    pub fn timeout_seconds(mut self, secs: u64) -> Self {
        self.timeout_seconds = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }
}

/// A registry record for one workflow run.
///
/// Serde names match the persisted registry format
/// (`template`, `instance`, `branch`, `status`, `created_at`, `pid`).
/// Unknown fields are tolerated on load; everything except `id` and
/// `template` carries a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEntry {
    pub id: String,
    #[serde(rename = "template")]
    pub template_name: String,
    #[serde(rename = "instance", default)]
    pub instance_name: String,
    #[serde(rename = "branch", default)]
    pub active_branch: String,
    #[serde(default)]
    pub environment: String,
    #[serde(rename = "status", default = "default_state")]
    pub state: WorkflowState,
    /// Executor process id; 0 when no executor is attached.
    #[serde(rename = "pid", default)]
    pub executor_pid: u32,
    /// Unix seconds when the entry was created.
    #[serde(rename = "created_at", default)]
    pub start_time: u64,
    /// Unix seconds of the last progress or state change.
    #[serde(rename = "last_active", default)]
    pub last_active: u64,
    /// Unix seconds when the entry went terminal; 0 while live.
    #[serde(default)]
    pub end_time: u64,
    /// Executor exit code; meaningful only in terminal states.
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default)]
    pub current_step: u32,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub last_step_name: String,
    #[serde(default)]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub max_retries: u32,
    /// Unix seconds of the most recent retry respawn; 0 if never retried.
    #[serde(default)]
    pub last_retry_time: u64,
    /// Set by the abandon API; consumed by the supervisor on reap.
    #[serde(default)]
    pub abandon_requested: bool,
    /// Set when the supervisor killed this workflow for exceeding its
    /// timeout; pins the recorded exit code to 124.
    #[serde(default, skip_serializing)]
    pub timeout_fired: bool,
}

fn default_state() -> WorkflowState {
    WorkflowState::Pending
}

impl WorkflowEntry {
    /// Create a new PENDING entry.
    pub fn new(config: WorkflowConfig, clock: &dyn Clock) -> Self {
        let now = clock.epoch_secs();
        Self {
            id: config.id,
            template_name: config.template_name,
            instance_name: config.instance_name,
            active_branch: config.active_branch,
            environment: config.environment,
            state: WorkflowState::Pending,
            executor_pid: 0,
            start_time: now,
            last_active: now,
            end_time: 0,
            exit_code: 0,
            current_step: 0,
            total_steps: 0,
            last_step_name: String::new(),
            timeout_seconds: config.timeout_seconds,
            retry_count: 0,
            max_retries: config.max_retries,
            last_retry_time: 0,
            abandon_requested: false,
            timeout_fired: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Record a successful spawn.
    pub fn mark_running(&mut self, pid: u32, now: u64) {
        self.state = WorkflowState::Running;
        self.executor_pid = pid;
        self.last_active = now;
    }

    /// Record a retry respawn being scheduled.
    pub fn mark_retrying(&mut self, now: u64) {
        self.state = WorkflowState::Pending;
        self.executor_pid = 0;
        self.retry_count += 1;
        self.last_retry_time = now;
        self.last_active = now;
    }

    /// Whether a nonzero exit should be retried rather than failed.
    pub fn retries_left(&self) -> bool {
        self.retry_count < self.max_retries && !self.abandon_requested
    }

    /// Record step progress. Progress is monotonic: a report for an
    /// earlier step than the current one is ignored.
    pub fn record_progress(&mut self, current_step: u32, total_steps: u32, step_name: &str, now: u64) {
        if current_step < self.current_step {
            return;
        }
        self.current_step = current_step;
        if total_steps > 0 {
            self.total_steps = total_steps;
        }
        if !step_name.is_empty() {
            self.last_step_name = step_name.to_string();
        }
        self.last_active = now;
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
