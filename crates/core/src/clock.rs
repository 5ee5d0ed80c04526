// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock time.
///
/// Production code uses [`SystemClock`]; tests use [`FakeClock`] to pin
/// timestamps (workflow ids are derived from the clock, so a stubbed clock
/// can force id collisions on purpose).
pub trait Clock: Send + Sync {
    /// Microseconds since the Unix epoch.
    fn epoch_us(&self) -> u64;

    /// Milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> u64 {
        self.epoch_us() / 1_000
    }

    /// Seconds since the Unix epoch.
    fn epoch_secs(&self) -> u64 {
        self.epoch_us() / 1_000_000
    }
}

/// Real wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_us(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Clock;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Settable clock for deterministic tests
    #[derive(Debug, Clone)]
    pub struct FakeClock {
        epoch_us: Arc<AtomicU64>,
    }

    impl FakeClock {
        /// Create a clock pinned at an arbitrary nonzero time.
        pub fn new() -> Self {
            Self::at_epoch_secs(1_700_000_000)
        }

        pub fn at_epoch_secs(secs: u64) -> Self {
            Self {
                epoch_us: Arc::new(AtomicU64::new(secs * 1_000_000)),
            }
        }

        pub fn set_epoch_us(&self, us: u64) {
            self.epoch_us.store(us, Ordering::SeqCst);
        }

        pub fn advance_secs(&self, secs: u64) {
            self.epoch_us.fetch_add(secs * 1_000_000, Ordering::SeqCst);
        }

        pub fn advance_us(&self, us: u64) {
            self.epoch_us.fetch_add(us, Ordering::SeqCst);
        }
    }

    impl Default for FakeClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for FakeClock {
        fn epoch_us(&self) -> u64 {
            self.epoch_us.load(Ordering::SeqCst)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeClock;

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
