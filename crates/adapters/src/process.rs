// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor process signalling.
//!
//! The supervisor drives pause/resume/abandon and timeout escalation by
//! signalling the executor's process group. The trait seam keeps the
//! supervisor testable with a fake that records signals and scripts
//! liveness.

use thiserror::Error;

/// Control signals the daemon sends to executors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSignal {
    /// SIGUSR1: checkpoint and hold between steps.
    Pause,
    /// SIGUSR2: clear the pause flag.
    Resume,
    /// SIGTERM: finish the current sub-step and exit cleanly.
    Terminate,
    /// SIGKILL: escalation when the grace period expires.
    Kill,
}

/// Process adapter errors
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no such process: {0}")]
    NoSuchProcess(u32),

    #[error("signal delivery failed for pid {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Signal delivery and liveness probing.
pub trait ProcessAdapter: Send + Sync {
    /// Deliver a signal to a single process.
    fn signal(&self, pid: u32, signal: ProcessSignal) -> Result<(), ProcessError>;

    /// Deliver a signal to a whole process group (executors call
    /// `setpgid(0,0)`-equivalent at spawn, so the group is theirs).
    fn signal_group(&self, pgid: u32, signal: ProcessSignal) -> Result<(), ProcessError>;

    /// Probe liveness without delivering anything (signal 0).
    fn is_alive(&self, pid: u32) -> bool;
}

mod unix {
    use super::{ProcessAdapter, ProcessError, ProcessSignal};
    use nix::sys::signal::{kill, killpg, Signal};
    use nix::unistd::Pid;

    /// Real signal delivery via `kill(2)` / `killpg(2)`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UnixProcessAdapter;

    impl UnixProcessAdapter {
        pub fn new() -> Self {
            Self
        }
    }

    fn to_signal(signal: ProcessSignal) -> Signal {
        match signal {
            ProcessSignal::Pause => Signal::SIGUSR1,
            ProcessSignal::Resume => Signal::SIGUSR2,
            ProcessSignal::Terminate => Signal::SIGTERM,
            ProcessSignal::Kill => Signal::SIGKILL,
        }
    }

    fn map_errno(pid: u32, errno: nix::errno::Errno) -> ProcessError {
        match errno {
            nix::errno::Errno::ESRCH => ProcessError::NoSuchProcess(pid),
            other => ProcessError::Signal {
                pid,
                source: std::io::Error::from_raw_os_error(other as i32),
            },
        }
    }

    impl ProcessAdapter for UnixProcessAdapter {
        fn signal(&self, pid: u32, signal: ProcessSignal) -> Result<(), ProcessError> {
            kill(Pid::from_raw(pid as i32), to_signal(signal))
                .map_err(|e| map_errno(pid, e))
        }

        fn signal_group(&self, pgid: u32, signal: ProcessSignal) -> Result<(), ProcessError> {
            killpg(Pid::from_raw(pgid as i32), to_signal(signal))
                .map_err(|e| map_errno(pgid, e))
        }

        fn is_alive(&self, pid: u32) -> bool {
            kill(Pid::from_raw(pid as i32), None).is_ok()
        }
    }
}

pub use unix::UnixProcessAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{ProcessAdapter, ProcessError, ProcessSignal};
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Records signals and scripts liveness for supervisor tests.
    #[derive(Debug, Clone, Default)]
    pub struct FakeProcessAdapter {
        inner: Arc<Mutex<FakeInner>>,
    }

    #[derive(Debug, Default)]
    struct FakeInner {
        alive: HashSet<u32>,
        signals: Vec<(u32, ProcessSignal)>,
        group_signals: Vec<(u32, ProcessSignal)>,
    }

    impl FakeProcessAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_alive(&self, pid: u32, alive: bool) {
            let mut inner = self.inner.lock();
            if alive {
                inner.alive.insert(pid);
            } else {
                inner.alive.remove(&pid);
            }
        }

        pub fn signals(&self) -> Vec<(u32, ProcessSignal)> {
            self.inner.lock().signals.clone()
        }

        pub fn group_signals(&self) -> Vec<(u32, ProcessSignal)> {
            self.inner.lock().group_signals.clone()
        }
    }

    impl ProcessAdapter for FakeProcessAdapter {
        fn signal(&self, pid: u32, signal: ProcessSignal) -> Result<(), ProcessError> {
            let mut inner = self.inner.lock();
            if !inner.alive.contains(&pid) {
                return Err(ProcessError::NoSuchProcess(pid));
            }
            inner.signals.push((pid, signal));
            Ok(())
        }

        fn signal_group(&self, pgid: u32, signal: ProcessSignal) -> Result<(), ProcessError> {
            let mut inner = self.inner.lock();
            if !inner.alive.contains(&pgid) {
                return Err(ProcessError::NoSuchProcess(pgid));
            }
            inner.group_signals.push((pgid, signal));
            Ok(())
        }

        fn is_alive(&self, pid: u32) -> bool {
            self.inner.lock().alive.contains(&pid)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeProcessAdapter;

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
