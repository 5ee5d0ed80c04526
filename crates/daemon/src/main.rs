// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argo Daemon (argod)
//!
//! Long-lived background process serving the workflow HTTP API and
//! supervising executor children.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod http;
mod lifecycle;
mod mailbox;
mod protocol;

use lifecycle::{Config, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("argod {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("argod {}", env!("CARGO_PKG_VERSION"));
                println!("Argo Daemon - workflow orchestration control plane");
                println!();
                println!("USAGE:");
                println!("    argod");
                println!();
                println!("The daemon is typically started by the `arc` CLI and should not");
                println!("be invoked directly. It serves HTTP on ARGO_DAEMON_HOST:ARGO_DAEMON_PORT");
                println!("(default localhost:9876) and supervises argo-exec children.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: argod [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    // Rotate the daemon's own log if it has grown too large.
    argo_storage::log_rotate::rotate_if_larger(&config.log_path, 10 * 1024 * 1024);

    // Write startup marker to log (before tracing setup, so clients can
    // find where this attempt begins).
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!("Starting daemon");

    let daemon = match lifecycle::spawn_daemon(config.clone()).await {
        Ok(daemon) => daemon,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("argod is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    info!("Daemon ready, listening on {}", daemon.addr);

    // Signal ready for a parent process waiting on startup.
    println!("READY {}", daemon.addr);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    daemon.stop().await;
    info!("Daemon stopped");
    Ok(())
}

/// Startup marker prefix written to the log before anything else.
/// Full format: "--- argod: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- argod: starting (pid: ";

fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---\n", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

/// Write a startup error synchronously so it is visible even if the
/// process exits before the non-blocking tracing writer flushes.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
