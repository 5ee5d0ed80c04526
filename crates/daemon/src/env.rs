// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable accessors for daemon configuration.

use std::path::PathBuf;
use std::time::Duration;

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn var_u64(name: &str) -> Option<u64> {
    var(name).and_then(|v| v.parse().ok())
}

/// `ARGO_DAEMON_PORT`, default 9876.
pub fn daemon_port() -> u16 {
    var_u64("ARGO_DAEMON_PORT")
        .and_then(|v| u16::try_from(v).ok())
        .unwrap_or(9876)
}

/// `ARGO_DAEMON_HOST`, default `localhost`.
pub fn daemon_host() -> String {
    var("ARGO_DAEMON_HOST").unwrap_or_else(|| "localhost".to_string())
}

/// `ARGO_ROOT`, default `$HOME/.argo`.
pub fn argo_root() -> Option<PathBuf> {
    if let Some(root) = var("ARGO_ROOT") {
        return Some(PathBuf::from(root));
    }
    var("HOME").map(|home| PathBuf::from(home).join(".argo"))
}

/// `ARGO_MONITOR_INTERVAL_MS`, default 5000 (supervisor tick).
pub fn monitor_interval() -> Duration {
    Duration::from_millis(var_u64("ARGO_MONITOR_INTERVAL_MS").unwrap_or(5_000))
}

/// `ARGO_TIMEOUT_CHECK_MS`, default 10000 (timeout scan).
pub fn timeout_check_interval() -> Duration {
    Duration::from_millis(var_u64("ARGO_TIMEOUT_CHECK_MS").unwrap_or(10_000))
}

/// `ARGO_FLUSH_INTERVAL_MS`, default 2000 (registry save coalescing).
pub fn flush_interval() -> Duration {
    Duration::from_millis(var_u64("ARGO_FLUSH_INTERVAL_MS").unwrap_or(2_000))
}

/// `ARGO_PRUNE_AGE_SECS`, default 24h (terminal entry retention).
pub fn prune_age() -> Duration {
    Duration::from_secs(var_u64("ARGO_PRUNE_AGE_SECS").unwrap_or(24 * 60 * 60))
}

/// `ARGO_SHUTDOWN_BUDGET_SECS`, default 10 (graceful shutdown wait).
pub fn shutdown_budget() -> Duration {
    Duration::from_secs(var_u64("ARGO_SHUTDOWN_BUDGET_SECS").unwrap_or(10))
}

/// `ARGO_DEFAULT_TIMEOUT_SECS`, default 3600 (per-workflow timeout).
pub fn default_workflow_timeout_secs() -> u64 {
    var_u64("ARGO_DEFAULT_TIMEOUT_SECS").unwrap_or(3_600)
}

/// `ARGO_DEFAULT_MAX_RETRIES`, default 0.
pub fn default_max_retries() -> u32 {
    var_u64("ARGO_DEFAULT_MAX_RETRIES").unwrap_or(0) as u32
}

/// `ARGO_EXECUTOR_BIN`: explicit executor path; default is `argo-exec`
/// next to the daemon binary.
pub fn executor_bin() -> Option<PathBuf> {
    var("ARGO_EXECUTOR_BIN").map(PathBuf::from)
}

/// `ARGO_CI_COMMAND`: program for the `command` CI provider.
pub fn ci_command() -> Option<String> {
    var("ARGO_CI_COMMAND")
}
