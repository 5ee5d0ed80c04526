// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor lifecycle manager: start, supervise, signal, finalize.
//!
//! Everything here is a deterministic tick machine. Deferred work (retry
//! respawns after backoff, SIGKILL escalation after the SIGTERM grace)
//! is held as due-times against the clock rather than as sleeping tasks,
//! so tests drive the whole lifecycle with a fake clock and explicit
//! ticks.

use crate::error::EngineError;
use crate::spawn::{SpawnSpec, Spawner};
use crate::validate::{validate_env, validate_script_path};
use argo_adapters::{ProcessAdapter, ProcessSignal};
use argo_core::limits::{exit_code, RETRY_DELAY_BASE, TERM_GRACE};
use argo_core::{Clock, ExitEvent, ExitQueue, WorkflowConfig, WorkflowEntry, WorkflowId, WorkflowState};
use argo_storage::{RegistryError, WorkflowRegistry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Supervisor timing and start defaults.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Interval between supervisor ticks (exit processing).
    pub completion_interval: Duration,
    /// Interval between timeout scans (a multiple of ticks).
    pub timeout_interval: Duration,
    /// Base for retry backoff: `base * 2^retry_count`.
    pub retry_delay_base: Duration,
    /// Grace between SIGTERM and SIGKILL.
    pub term_grace: Duration,
    /// Timeout applied when a start request names none.
    pub default_timeout_seconds: u64,
    /// Retry budget applied when a start request names none.
    pub default_max_retries: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            completion_interval: Duration::from_secs(5),
            timeout_interval: Duration::from_secs(10),
            retry_delay_base: RETRY_DELAY_BASE,
            term_grace: TERM_GRACE,
            default_timeout_seconds: 3600,
            default_max_retries: 0,
        }
    }
}

/// A validated-to-be start request.
#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    pub script: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub instance: Option<String>,
    pub branch: Option<String>,
    pub environment: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone)]
struct PendingRespawn {
    id: String,
    due_at: u64,
}

#[derive(Debug, Clone)]
struct PendingKill {
    id: String,
    pid: u32,
    due_at: u64,
}

/// The executor lifecycle manager.
pub struct ExecutorLifecycle<P: ProcessAdapter, S: Spawner> {
    registry: Arc<WorkflowRegistry>,
    queue: Arc<ExitQueue>,
    procs: P,
    spawner: S,
    clock: Arc<dyn Clock>,
    config: LifecycleConfig,
    /// Spawn parameters retained per live workflow for retry respawns.
    specs: Mutex<HashMap<String, SpawnSpec>>,
    respawns: Mutex<Vec<PendingRespawn>>,
    kills: Mutex<Vec<PendingKill>>,
    accepting: AtomicBool,
    last_timeout_scan: AtomicU64,
    dropped_seen: AtomicU64,
}

impl<P: ProcessAdapter, S: Spawner> ExecutorLifecycle<P, S> {
    pub fn new(
        registry: Arc<WorkflowRegistry>,
        queue: Arc<ExitQueue>,
        procs: P,
        spawner: S,
        clock: Arc<dyn Clock>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            registry,
            queue,
            procs,
            spawner,
            clock,
            config,
            specs: Mutex::new(HashMap::new()),
            respawns: Mutex::new(Vec::new()),
            kills: Mutex::new(Vec::new()),
            accepting: AtomicBool::new(true),
            last_timeout_scan: AtomicU64::new(0),
            dropped_seen: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<WorkflowRegistry> {
        &self.registry
    }

    /// Accept a start request: validate, register, spawn.
    pub async fn start(&self, request: StartRequest) -> Result<WorkflowEntry, EngineError> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(EngineError::ShuttingDown);
        }

        let script = validate_script_path(&request.script)?;
        validate_env(&request.env)?;

        let id = match request.instance.as_deref() {
            Some(instance) if !instance.is_empty() => {
                let stem = script
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("wf");
                WorkflowId::from_parts(stem, instance)
            }
            _ => WorkflowId::allocate(self.clock.as_ref()),
        };

        let entry = WorkflowEntry::new(
            WorkflowConfig::new(id.as_str(), request.script.clone())
                .instance(request.instance.clone().unwrap_or_default())
                .branch(request.branch.clone().unwrap_or_default())
                .environment(request.environment.clone().unwrap_or_default())
                .timeout_seconds(
                    request
                        .timeout_seconds
                        .unwrap_or(self.config.default_timeout_seconds),
                )
                .max_retries(
                    request
                        .max_retries
                        .unwrap_or(self.config.default_max_retries),
                ),
            self.clock.as_ref(),
        );
        self.registry.add(entry.clone())?;

        let spec = SpawnSpec {
            template_path: script,
            args: request.args,
            env: request.env,
        };
        self.specs.lock().insert(entry.id.clone(), spec.clone());

        let now = self.clock.epoch_secs();
        match self.spawner.spawn(&entry, &spec).await {
            Ok(pid) => {
                let updated = self.registry.update(&entry.id, |e| e.mark_running(pid, now))?;
                Ok(updated)
            }
            Err(e) => {
                error!(workflow_id = %entry.id, error = %e, "spawn failed");
                self.specs.lock().remove(&entry.id);
                self.registry.finalize(
                    &entry.id,
                    WorkflowState::Failed,
                    exit_code::EXEC_NOT_FOUND,
                    now,
                )?;
                Err(e)
            }
        }
    }

    /// SIGUSR1 the executor and mark the entry paused.
    pub fn pause(&self, id: &str) -> Result<WorkflowEntry, EngineError> {
        let entry = self.find(id)?;
        if entry.state != WorkflowState::Running {
            return Err(EngineError::WrongState {
                id: id.to_string(),
                state: entry.state,
            });
        }
        self.procs
            .signal_group(entry.executor_pid, ProcessSignal::Pause)?;
        let now = self.clock.epoch_secs();
        self.registry.update_state(id, WorkflowState::Paused, now)?;
        info!(workflow_id = id, "workflow paused");
        self.find(id)
    }

    /// SIGUSR2 the executor and mark the entry running again.
    pub fn resume(&self, id: &str) -> Result<WorkflowEntry, EngineError> {
        let entry = self.find(id)?;
        if entry.state != WorkflowState::Paused {
            return Err(EngineError::WrongState {
                id: id.to_string(),
                state: entry.state,
            });
        }
        self.procs
            .signal_group(entry.executor_pid, ProcessSignal::Resume)?;
        let now = self.clock.epoch_secs();
        self.registry
            .update_state(id, WorkflowState::Running, now)?;
        info!(workflow_id = id, "workflow resumed");
        self.find(id)
    }

    /// Request abandonment. Live executors get SIGTERM and are finalized
    /// by the supervisor on reap; pending entries finalize immediately.
    pub fn abandon(&self, id: &str) -> Result<WorkflowEntry, EngineError> {
        let entry = self.find(id)?;
        if entry.is_terminal() {
            return Err(EngineError::WrongState {
                id: id.to_string(),
                state: entry.state,
            });
        }

        let now = self.clock.epoch_secs();
        self.registry.update(id, |e| {
            e.abandon_requested = true;
            e.last_active = now;
        })?;

        match entry.state {
            WorkflowState::Pending => {
                self.registry
                    .finalize(id, WorkflowState::Abandoned, 0, now)?;
                self.specs.lock().remove(id);
                self.respawns.lock().retain(|r| r.id != id);
            }
            WorkflowState::Running | WorkflowState::Paused if entry.executor_pid > 0 => {
                // ESRCH races with a natural exit; the reaper settles it.
                if let Err(e) = self
                    .procs
                    .signal_group(entry.executor_pid, ProcessSignal::Terminate)
                {
                    debug!(workflow_id = id, error = %e, "terminate on abandon");
                }
            }
            _ => {}
        }
        info!(workflow_id = id, "abandon requested");
        self.find(id)
    }

    /// One supervisor pass. The daemon calls this on a timer; tests call
    /// it directly after advancing the fake clock.
    pub async fn tick(&self) {
        self.process_exit_events();
        self.check_timeouts();
        self.fire_due_kills();
        self.fire_due_respawns().await;
        self.reconcile_if_dropped();
    }

    /// Supervisor loop for the daemon.
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.completion_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// Drain the exit queue and finalize or retry each owning entry.
    pub fn process_exit_events(&self) {
        for event in self.queue.drain() {
            match self.registry.find_by_pid(event.pid) {
                Some(entry) => self.handle_exit(entry, event),
                None => debug!(pid = event.pid, "exit for unknown pid ignored"),
            }
        }
    }

    fn handle_exit(&self, entry: WorkflowEntry, event: ExitEvent) {
        let id = entry.id.clone();
        let now = event.timestamp.max(self.clock.epoch_secs());
        let code = event.exit_code;

        let outcome = if entry.abandon_requested {
            self.finalize(&id, WorkflowState::Abandoned, code, now)
        } else if entry.timeout_fired || code == exit_code::TIMEOUT {
            self.finalize(&id, WorkflowState::Failed, exit_code::TIMEOUT, now)
        } else if code == exit_code::SUCCESS {
            self.finalize(&id, WorkflowState::Completed, 0, now)
        } else if entry.state == WorkflowState::Running && entry.retries_left() {
            let backoff = self.config.retry_delay_base.as_secs()
                << entry.retry_count.min(16);
            let result = self.registry.update(&id, |e| e.mark_retrying(now));
            match result {
                Ok(_) => {
                    info!(
                        workflow_id = %id,
                        exit_code = code,
                        retry = entry.retry_count + 1,
                        backoff_secs = backoff,
                        "retrying after failure"
                    );
                    self.respawns.lock().push(PendingRespawn {
                        id: id.clone(),
                        due_at: now + backoff,
                    });
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        } else {
            self.finalize(&id, WorkflowState::Failed, code, now)
        };

        if let Err(e) = outcome {
            warn!(workflow_id = %id, error = %e, "exit handling failed");
        }
    }

    fn finalize(
        &self,
        id: &str,
        state: WorkflowState,
        code: i32,
        now: u64,
    ) -> Result<(), EngineError> {
        self.registry.finalize(id, state, code, now)?;
        self.specs.lock().remove(id);
        self.kills.lock().retain(|k| k.id != id);
        self.respawns.lock().retain(|r| r.id != id);
        Ok(())
    }

    /// SIGTERM any running workflow past its timeout; schedule SIGKILL
    /// escalation after the grace period.
    fn check_timeouts(&self) {
        let now = self.clock.epoch_secs();
        let last = self.last_timeout_scan.load(Ordering::SeqCst);
        if now < last + self.config.timeout_interval.as_secs() {
            return;
        }
        self.last_timeout_scan.store(now, Ordering::SeqCst);

        for entry in self.registry.list() {
            let expired = entry.state == WorkflowState::Running
                && !entry.timeout_fired
                && entry.timeout_seconds > 0
                && entry.executor_pid > 0
                && now > self.run_started(&entry) + entry.timeout_seconds;
            if !expired {
                continue;
            }

            warn!(
                workflow_id = %entry.id,
                pid = entry.executor_pid,
                timeout_seconds = entry.timeout_seconds,
                "workflow timed out, terminating"
            );
            if let Err(e) = self.registry.update(&entry.id, |e| e.timeout_fired = true) {
                warn!(workflow_id = %entry.id, error = %e, "timeout flag update failed");
                continue;
            }
            if let Err(e) = self
                .procs
                .signal_group(entry.executor_pid, ProcessSignal::Terminate)
            {
                debug!(workflow_id = %entry.id, error = %e, "terminate on timeout");
            }
            self.kills.lock().push(PendingKill {
                id: entry.id.clone(),
                pid: entry.executor_pid,
                due_at: now + self.config.term_grace.as_secs(),
            });
        }
    }

    /// Escalate to SIGKILL where the grace period expired.
    fn fire_due_kills(&self) {
        let now = self.clock.epoch_secs();
        let due: Vec<PendingKill> = {
            let mut kills = self.kills.lock();
            let (fire, keep): (Vec<_>, Vec<_>) =
                kills.drain(..).partition(|k| now >= k.due_at);
            *kills = keep;
            fire
        };
        for kill in due {
            if self.procs.is_alive(kill.pid) {
                warn!(workflow_id = %kill.id, pid = kill.pid, "grace expired, killing");
                if let Err(e) = self.procs.signal_group(kill.pid, ProcessSignal::Kill) {
                    debug!(workflow_id = %kill.id, error = %e, "kill escalation");
                }
            }
        }
    }

    /// Respawn retried workflows whose backoff has elapsed.
    async fn fire_due_respawns(&self) {
        let now = self.clock.epoch_secs();
        let due: Vec<PendingRespawn> = {
            let mut respawns = self.respawns.lock();
            let (fire, keep): (Vec<_>, Vec<_>) =
                respawns.drain(..).partition(|r| now >= r.due_at);
            *respawns = keep;
            fire
        };
        for respawn in due {
            self.respawn(&respawn.id).await;
        }
    }

    async fn respawn(&self, id: &str) {
        let Some(entry) = self.registry.find(id) else {
            return;
        };
        if entry.state != WorkflowState::Pending {
            return;
        }
        let now = self.clock.epoch_secs();
        if entry.abandon_requested {
            let _ = self.finalize(id, WorkflowState::Abandoned, 0, now);
            return;
        }
        let spec = match self.specs.lock().get(id) {
            Some(spec) => spec.clone(),
            None => {
                warn!(workflow_id = id, "no spawn spec for retry, failing");
                let _ = self.finalize(id, WorkflowState::Failed, exit_code::FAILURE, now);
                return;
            }
        };

        match self.spawner.spawn(&entry, &spec).await {
            Ok(pid) => {
                info!(workflow_id = id, pid, retry = entry.retry_count, "executor respawned");
                if let Err(e) = self.registry.update(id, |e| e.mark_running(pid, now)) {
                    warn!(workflow_id = id, error = %e, "respawn bookkeeping failed");
                }
            }
            Err(e) => {
                error!(workflow_id = id, error = %e, "respawn failed");
                let _ = self.finalize(id, WorkflowState::Failed, exit_code::EXEC_NOT_FOUND, now);
            }
        }
    }

    /// When the exit queue dropped events, probe liveness of every
    /// supervised pid and defensively finalize the dead.
    fn reconcile_if_dropped(&self) {
        let dropped = self.queue.dropped();
        let seen = self.dropped_seen.swap(dropped, Ordering::SeqCst);
        if dropped <= seen {
            return;
        }
        warn!(missed = dropped - seen, "exit events dropped, reconciling");

        let now = self.clock.epoch_secs();
        for entry in self.registry.list() {
            let supervised = !entry.is_terminal()
                && entry.executor_pid > 0
                && entry.state != WorkflowState::Pending;
            if !supervised || self.procs.is_alive(entry.executor_pid) {
                continue;
            }
            let (state, code) = if entry.abandon_requested {
                (WorkflowState::Abandoned, 0)
            } else if entry.timeout_fired {
                (WorkflowState::Failed, exit_code::TIMEOUT)
            } else {
                (WorkflowState::Failed, exit_code::FAILURE)
            };
            warn!(
                workflow_id = %entry.id,
                pid = entry.executor_pid,
                "executor gone with no exit event, finalizing {state}"
            );
            let _ = self.finalize(&entry.id, state, code, now);
        }
    }

    /// Reconcile entries loaded from a previous daemon run. Without a
    /// `Child` to await, a survivor cannot be supervised: live executors
    /// are terminated and every non-terminal entry is failed.
    pub fn recover_stale_entries(&self) {
        let now = self.clock.epoch_secs();
        for entry in self.registry.list() {
            if entry.is_terminal() {
                continue;
            }
            if entry.executor_pid > 0 && self.procs.is_alive(entry.executor_pid) {
                warn!(
                    workflow_id = %entry.id,
                    pid = entry.executor_pid,
                    "terminating orphaned executor from previous daemon"
                );
                let _ = self
                    .procs
                    .signal_group(entry.executor_pid, ProcessSignal::Terminate);
            }
            let _ = self.registry.finalize(
                &entry.id,
                WorkflowState::Failed,
                exit_code::FAILURE,
                now,
            );
        }
    }

    /// Graceful shutdown: stop accepting, SIGTERM every live executor,
    /// wait up to `budget` for exits, then SIGKILL the stragglers.
    pub async fn shutdown(&self, budget: Duration) {
        self.accepting.store(false, Ordering::SeqCst);

        let live: Vec<WorkflowEntry> = self
            .registry
            .list()
            .into_iter()
            .filter(|e| {
                matches!(e.state, WorkflowState::Running | WorkflowState::Paused)
                    && e.executor_pid > 0
            })
            .collect();

        for entry in &live {
            info!(workflow_id = %entry.id, pid = entry.executor_pid, "terminating for shutdown");
            let _ = self
                .procs
                .signal_group(entry.executor_pid, ProcessSignal::Terminate);
        }

        let deadline = tokio::time::Instant::now() + budget;
        loop {
            self.process_exit_events();
            let pending = self
                .registry
                .list()
                .into_iter()
                .any(|e| {
                    matches!(e.state, WorkflowState::Running | WorkflowState::Paused)
                        && e.executor_pid > 0
                });
            if !pending || tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let now = self.clock.epoch_secs();
        for entry in self.registry.list() {
            let straggler = matches!(
                entry.state,
                WorkflowState::Running | WorkflowState::Paused
            ) && entry.executor_pid > 0;
            if !straggler {
                continue;
            }
            warn!(workflow_id = %entry.id, pid = entry.executor_pid, "killing straggler");
            let _ = self.procs.signal_group(entry.executor_pid, ProcessSignal::Kill);
            let state = if entry.abandon_requested {
                WorkflowState::Abandoned
            } else {
                WorkflowState::Failed
            };
            let _ = self.finalize(&entry.id, state, exit_code::SIGNALLED, now);
        }
    }

    fn find(&self, id: &str) -> Result<WorkflowEntry, EngineError> {
        self.registry
            .find(id)
            .ok_or_else(|| EngineError::Registry(RegistryError::NotFound(id.to_string())))
    }

    fn run_started(&self, entry: &WorkflowEntry) -> u64 {
        if entry.last_retry_time > 0 {
            entry.last_retry_time
        } else {
            entry.start_time
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
