// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, background tasks, shutdown.

use std::fs::File;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use argo_adapters::{CommandProvider, ProviderRegistry, UnixProcessAdapter};
use argo_core::{Clock, ExitQueue, SystemClock};
use argo_engine::{spawn_reaper, ExecutorLifecycle, ExecutorSpawner, LifecycleConfig, SpawnConfig};
use argo_storage::{RegistryError, WorkflowCheckpoint, WorkflowRegistry};
use fs2::FileExt;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::http::{router, ApiContext};
use crate::mailbox::Mailbox;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.argo)
    pub root: PathBuf,
    /// Bind host
    pub host: String,
    /// Bind port (0 picks an ephemeral port)
    pub port: u16,
    /// Path to the registry JSON file
    pub registry_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to the daemon's own log file
    pub log_path: PathBuf,
    /// Directory of per-workflow log files
    pub logs_dir: PathBuf,
    /// Directory of workflow checkpoints
    pub checkpoints_dir: PathBuf,
    /// Path to the `argo-exec` binary
    pub executor_bin: PathBuf,
    /// Terminal entries older than this are pruned
    pub prune_age: Duration,
    /// Registry dirty-flag flush cadence
    pub flush_interval: Duration,
    /// Graceful-shutdown wait before SIGKILL escalation
    pub shutdown_budget: Duration,
    /// Supervisor timing and start defaults
    pub lifecycle: LifecycleConfig,
    /// Optional program backing the `command` CI provider
    pub ci_command: Option<String>,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Uses fixed paths under `$ARGO_ROOT` (default `~/.argo`). One
    /// daemon serves all workflows for a user.
    pub fn load() -> Result<Self, LifecycleError> {
        let root = crate::env::argo_root().ok_or(LifecycleError::NoStateDir)?;

        let executor_bin = match crate::env::executor_bin() {
            Some(bin) => bin,
            None => std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|d| d.join("argo-exec")))
                .ok_or(LifecycleError::NoStateDir)?,
        };

        Ok(Self {
            host: crate::env::daemon_host(),
            port: crate::env::daemon_port(),
            registry_path: root.join("registry.json"),
            lock_path: root.join("daemon.lock"),
            log_path: root.join("daemon.log"),
            logs_dir: root.join("logs"),
            checkpoints_dir: root.join("workflows").join("checkpoints"),
            executor_bin,
            prune_age: crate::env::prune_age(),
            flush_interval: crate::env::flush_interval(),
            shutdown_budget: crate::env::shutdown_budget(),
            lifecycle: LifecycleConfig {
                completion_interval: crate::env::monitor_interval(),
                timeout_interval: crate::env::timeout_check_interval(),
                default_timeout_seconds: crate::env::default_workflow_timeout_secs(),
                default_max_retries: crate::env::default_max_retries(),
                ..LifecycleConfig::default()
            },
            ci_command: crate::env::ci_command(),
            root,
        })
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind {0}:{1}: {2}")]
    BindFailed(String, u16, std::io::Error),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running daemon: bound address, shared context, background tasks.
pub struct DaemonHandle {
    pub addr: SocketAddr,
    pub context: Arc<ApiContext>,
    pub config: Config,
    // NOTE(lifetime): Held to maintain the exclusive lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    shutdown_tx: watch::Sender<bool>,
    server: JoinHandle<()>,
    supervisor: JoinHandle<()>,
    flusher: JoinHandle<()>,
    pruner: JoinHandle<()>,
}

/// Start the daemon: lock, recover, bind, and spawn every background
/// task. Returns once the HTTP listener is accepting.
pub async fn spawn_daemon(config: Config) -> Result<DaemonHandle, LifecycleError> {
    std::fs::create_dir_all(&config.root)?;
    std::fs::create_dir_all(&config.logs_dir)?;
    std::fs::create_dir_all(&config.checkpoints_dir)?;

    // Acquire the lock first; never truncate before holding it, or a
    // losing race would wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    {
        use std::io::Write;
        let mut lock_file = &lock_file;
        lock_file.set_len(0)?;
        writeln!(lock_file, "{}", std::process::id())?;
    }

    // Recover persisted state.
    let registry = Arc::new(WorkflowRegistry::load(&config.registry_path)?);
    info!(
        workflows = registry.count(None),
        path = %config.registry_path.display(),
        "registry loaded"
    );

    // Bind before wiring anything that could spawn work.
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|e| LifecycleError::BindFailed(config.host.clone(), config.port, e))?;
    let addr = listener.local_addr()?;
    let daemon_url = format!("http://{}:{}", config.host, addr.port());

    // Engine wiring: queue ← reaper ← spawner, supervised lifecycle.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let queue = Arc::new(ExitQueue::default());
    let reaper = spawn_reaper(Arc::clone(&queue), Arc::clone(&clock));
    let spawner = ExecutorSpawner::new(
        SpawnConfig {
            executor_bin: config.executor_bin.clone(),
            log_dir: config.logs_dir.clone(),
            daemon_url,
            argo_root: config.root.clone(),
        },
        reaper,
    );
    let lifecycle = Arc::new(ExecutorLifecycle::new(
        Arc::clone(&registry),
        Arc::clone(&queue),
        UnixProcessAdapter::new(),
        spawner,
        Arc::clone(&clock),
        config.lifecycle.clone(),
    ));

    // Entries surviving a previous daemon cannot be supervised again.
    lifecycle.recover_stale_entries();

    let mut providers = ProviderRegistry::with_builtins();
    if let Some(program) = &config.ci_command {
        providers.register(Arc::new(CommandProvider::new(
            "command",
            program.clone(),
            vec![],
        )));
    }

    let context = Arc::new(ApiContext {
        lifecycle: Arc::clone(&lifecycle),
        registry: Arc::clone(&registry),
        mailbox: Mailbox::new(),
        providers,
        clock: Arc::clone(&clock),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let app = router(Arc::clone(&context));
    let server = tokio::spawn(serve(listener, app, shutdown_rx));
    let supervisor = tokio::spawn(Arc::clone(&lifecycle).run());
    let flusher = tokio::spawn(flush_loop(
        Arc::clone(&registry),
        config.registry_path.clone(),
        config.flush_interval,
    ));
    let pruner = tokio::spawn(prune_loop(Arc::clone(&context), config.clone()));

    info!(%addr, "daemon started");
    Ok(DaemonHandle {
        addr,
        context,
        config,
        lock_file,
        shutdown_tx,
        server,
        supervisor,
        flusher,
        pruner,
    })
}

impl DaemonHandle {
    /// Graceful shutdown: refuse new starts, terminate executors within
    /// the budget, persist the registry, stop the listener and tasks.
    pub async fn stop(self) {
        info!("Shutting down daemon...");

        self.context
            .lifecycle
            .shutdown(self.config.shutdown_budget)
            .await;

        if let Err(e) = self.context.registry.save(&self.config.registry_path) {
            warn!("Failed to persist registry on shutdown: {}", e);
        }

        let _ = self.shutdown_tx.send(true);
        self.supervisor.abort();
        self.flusher.abort();
        self.pruner.abort();
        if tokio::time::timeout(Duration::from_secs(5), self.server)
            .await
            .is_err()
        {
            warn!("HTTP server did not stop within 5s");
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove lock file: {}", e);
            }
        }
        info!("Daemon shutdown complete");
    }
}

async fn serve(listener: TcpListener, app: axum::Router, mut shutdown_rx: watch::Receiver<bool>) {
    let shutdown = async move {
        let _ = shutdown_rx.changed().await;
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!("HTTP server error: {}", e);
    }
}

/// Coalesced registry persistence: write only when dirty.
async fn flush_loop(registry: Arc<WorkflowRegistry>, path: PathBuf, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = registry.flush_if_dirty(&path) {
            error!("Failed to flush registry: {}", e);
        }
    }
}

/// Periodically prune aged-out terminal entries along with their logs,
/// checkpoints, and mailboxes.
async fn prune_loop(context: Arc<ApiContext>, config: Config) {
    let mut ticker = tokio::time::interval(Duration::from_secs(60).min(config.prune_age));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;

        let now = context.clock.epoch_secs();
        let cutoff = now.saturating_sub(config.prune_age.as_secs());
        let removed = context.registry.prune(cutoff);
        for id in &removed {
            context.mailbox.remove(id);
            if let Err(e) = WorkflowCheckpoint::remove(&config.checkpoints_dir, id) {
                warn!(workflow_id = %id, "checkpoint cleanup failed: {}", e);
            }
            let log_path = config.logs_dir.join(format!("{id}.log"));
            let _ = std::fs::remove_file(&log_path);
            for i in 1..=argo_storage::log_rotate::MAX_ROTATED_LOGS {
                let _ = std::fs::remove_file(format!("{}.{i}", log_path.display()));
            }
        }
        if !removed.is_empty() {
            info!(count = removed.len(), "pruned terminal workflows");
        }

        // Age out stale rotations for live workflows too.
        for entry in context.registry.list() {
            argo_storage::log_rotate::prune_old_rotations(
                &config.logs_dir.join(format!("{}.log", entry.id)),
            );
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
