// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared limits and exit-code conventions

use std::time::Duration;

/// Maximum length of a workflow id.
pub const MAX_WORKFLOW_ID_LEN: usize = 63;

/// Maximum length of the environment name stored on an entry.
pub const MAX_ENVIRONMENT_LEN: usize = 31;

/// Maximum size of a workflow template file (1 MiB).
pub const MAX_TEMPLATE_BYTES: u64 = 1024 * 1024;

/// Maximum number of steps in a template.
pub const MAX_TEMPLATE_STEPS: usize = 1000;

/// Maximum JSON nesting depth in a template.
pub const MAX_TEMPLATE_DEPTH: usize = 10;

/// Maximum step executions per workflow run (runaway-loop guard).
pub const MAX_STEP_EXECUTIONS: u32 = 1000;

/// Maximum executor log size before the driver aborts (100 MiB).
pub const MAX_EXECUTOR_LOG_BYTES: u64 = 100 * 1024 * 1024;

/// Base delay for retry backoff; actual delay is `base * 2^retry_count`.
pub const RETRY_DELAY_BASE: Duration = Duration::from_secs(2);

/// Grace period between SIGTERM and SIGKILL escalation.
pub const TERM_GRACE: Duration = Duration::from_secs(2);

/// Bounded capacity of a per-workflow input queue.
pub const INPUT_QUEUE_CAPACITY: usize = 10;

/// Sleep between input polls in the step driver.
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Sleep between pause-flag polls in the step driver.
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Exit codes shared between daemon and executor (mirrors GNU `timeout`
/// for 124 and the shell's 127 for exec-not-found).
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const SIGNALLED: i32 = 2;
    pub const TIMEOUT: i32 = 124;
    pub const EXEC_NOT_FOUND: i32 = 127;
}
