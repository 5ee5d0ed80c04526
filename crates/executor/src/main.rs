// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! argo-exec: the workflow executor.
//!
//! One short-lived process per workflow run. The daemon spawns it fully
//! detached (stdout/stderr already redirected to the per-workflow log,
//! own process group); everything interactive flows through the HTTP
//! I/O channel back to the daemon.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod driver;
mod progress;
mod signals;

use argo_adapters::{CiClient, HttpChannel};
use driver::{DriverConfig, StepDriver};
use progress::ProgressReporter;
use signals::SignalFlags;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_duration_ms(name: &str) -> Option<Duration> {
    env_var(name)
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn config_from_env() -> Result<DriverConfig, String> {
    let workflow_id =
        env_var("ARGO_WORKFLOW_ID").ok_or("ARGO_WORKFLOW_ID is not set")?;
    let template_path = env_var("ARGO_TEMPLATE_PATH")
        .map(PathBuf::from)
        .ok_or("ARGO_TEMPLATE_PATH is not set")?;
    let daemon_url = env_var("ARGO_DAEMON_URL")
        .unwrap_or_else(|| "http://localhost:9876".to_string());

    let checkpoint_dir = env_var("ARGO_ROOT")
        .map(PathBuf::from)
        .or_else(|| env_var("HOME").map(|h| PathBuf::from(h).join(".argo")))
        .map(|root| root.join("workflows").join("checkpoints"));

    Ok(DriverConfig {
        workflow_id,
        template_path,
        branch: env_var("ARGO_BRANCH").unwrap_or_default(),
        environment: env_var("ARGO_ENVIRONMENT").unwrap_or_default(),
        args: std::env::args().skip(1).collect(),
        log_path: env_var("ARGO_LOG_PATH").map(PathBuf::from),
        checkpoint_dir,
        input_poll_interval: env_duration_ms("ARGO_INPUT_POLL_MS")
            .unwrap_or(argo_core::limits::INPUT_POLL_INTERVAL),
        input_deadline: env_var("ARGO_INPUT_DEADLINE_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs),
        pause_poll_interval: env_duration_ms("ARGO_PAUSE_POLL_MS")
            .unwrap_or(argo_core::limits::PAUSE_POLL_INTERVAL),
        daemon_url,
    })
}

#[tokio::main]
async fn main() {
    // Plain fmt output: stdout is already the per-workflow log file.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match config_from_env() {
        Ok(config) => config,
        Err(message) => {
            error!("executor misconfigured: {message}");
            std::process::exit(argo_core::limits::exit_code::FAILURE);
        }
    };

    info!(
        workflow_id = %config.workflow_id,
        template = %config.template_path.display(),
        "executor starting"
    );

    let flags = SignalFlags::new();
    if let Err(e) = signals::install(&flags) {
        error!("failed to install signal handlers: {e}");
        std::process::exit(argo_core::limits::exit_code::FAILURE);
    }

    let channel = HttpChannel::new(&config.daemon_url, &config.workflow_id);
    let backend = CiClient::new(&config.daemon_url);
    let reporter = ProgressReporter::new(&config.daemon_url, &config.workflow_id);

    let mut driver = StepDriver::new(config, channel, backend, reporter, flags);
    let code = match driver.run().await {
        Ok(()) => {
            info!("workflow completed");
            argo_core::limits::exit_code::SUCCESS
        }
        Err(e) => {
            error!("workflow failed: {e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
