// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal flags for the step driver.
//!
//! SIGUSR1 sets the pause flag, SIGUSR2 clears it, SIGTERM sets the stop
//! flag. The driver polls the flags between steps and inside its input
//! loops; the handlers themselves only flip atomics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Shared pause/stop flags.
#[derive(Clone, Default)]
pub struct SignalFlags {
    paused: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl SignalFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn set_stopped(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Install the three handlers. Repeated signals are idempotent: pausing
/// a paused executor or resuming a running one changes nothing.
pub fn install(flags: &SignalFlags) -> std::io::Result<()> {
    let mut usr1 = signal(SignalKind::user_defined1())?;
    let mut usr2 = signal(SignalKind::user_defined2())?;
    let mut term = signal(SignalKind::terminate())?;

    let pause_flags = flags.clone();
    tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            info!("pause requested");
            pause_flags.set_paused(true);
        }
    });

    let resume_flags = flags.clone();
    tokio::spawn(async move {
        while usr2.recv().await.is_some() {
            info!("resume requested");
            resume_flags.set_paused(false);
        }
    });

    let stop_flags = flags.clone();
    tokio::spawn(async move {
        if term.recv().await.is_some() {
            info!("stop requested");
            stop_flags.set_stopped();
        }
    });

    Ok(())
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
