// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-exit reaping into the exit-code queue.
//!
//! The source design is a SIGCHLD handler feeding an async-signal-safe
//! ring. Under tokio the runtime owns SIGCHLD, so the equivalent is a
//! single reaper task that awaits every spawned `Child` and is the ring's
//! sole producer; the supervisor loop remains the sole consumer. The
//! queue contract (bounded, lock-free push, dropped counter) is
//! unchanged.

use argo_core::limits::exit_code;
use argo_core::{Clock, ExitQueue};
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::Arc;
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Handle for registering spawned children with the reaper task.
#[derive(Clone)]
pub struct ReaperHandle {
    tx: mpsc::UnboundedSender<(u32, Child)>,
}

impl ReaperHandle {
    /// Hand a spawned child to the reaper. The pid is captured at spawn
    /// time because `Child::id()` is gone once the process is waited.
    pub fn watch(&self, pid: u32, child: Child) {
        if self.tx.send((pid, child)).is_err() {
            warn!(pid, "reaper task gone, child exit will not be recorded");
        }
    }
}

/// Map an `ExitStatus` to the exit-code convention: the code itself, or
/// `128 + signal` for signal deaths.
pub fn status_to_exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0))
}

/// Spawn the reaper task. It owns every executor `Child`, awaits exits
/// concurrently, and pushes `(pid, exit_code)` into the queue.
pub fn spawn_reaper(queue: Arc<ExitQueue>, clock: Arc<dyn Clock>) -> ReaperHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<(u32, Child)>();

    tokio::spawn(async move {
        let mut waits: JoinSet<(u32, i32)> = JoinSet::new();
        loop {
            tokio::select! {
                registered = rx.recv() => {
                    match registered {
                        Some((pid, mut child)) => {
                            waits.spawn(async move {
                                let code = match child.wait().await {
                                    Ok(status) => status_to_exit_code(status),
                                    Err(e) => {
                                        warn!(pid, error = %e, "wait failed");
                                        exit_code::FAILURE
                                    }
                                };
                                (pid, code)
                            });
                        }
                        None => break,
                    }
                }
                Some(joined) = waits.join_next(), if !waits.is_empty() => {
                    if let Ok((pid, code)) = joined {
                        push_exit(&queue, clock.as_ref(), pid, code);
                    }
                }
            }
        }

        // Registration channel closed (daemon shutting down): drain the
        // remaining waits so no exit goes unrecorded.
        while let Some(joined) = waits.join_next().await {
            if let Ok((pid, code)) = joined {
                push_exit(&queue, clock.as_ref(), pid, code);
            }
        }
    });

    ReaperHandle { tx }
}

fn push_exit(queue: &ExitQueue, clock: &dyn Clock, pid: u32, code: i32) {
    let now = clock.epoch_secs();
    if queue.push(pid, code, now) {
        debug!(pid, exit_code = code, "child exit queued");
    } else {
        warn!(pid, exit_code = code, "exit queue full, event dropped");
    }
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
