// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded single-producer/single-consumer exit-code queue.
//!
//! The reaper task pushes `(pid, exit_code)` pairs as executor children are
//! waited on; the supervisor loop pops them. The push path takes no locks
//! and allocates nothing, so a child exit can never be lost to a lock held
//! elsewhere. When the ring is full the event is counted in `dropped`
//! instead, and the supervisor reconciles by probing executor liveness.

use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// Default ring capacity (usable slots).
pub const DEFAULT_CAPACITY: usize = 64;

/// One reaped child exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitEvent {
    pub pid: u32,
    pub exit_code: i32,
    /// Unix seconds when the exit was observed.
    pub timestamp: u64,
}

#[derive(Default)]
struct Slot {
    pid: AtomicU32,
    exit_code: AtomicI32,
    timestamp: AtomicU64,
}

/// Fixed-capacity SPSC ring.
///
/// One slot is kept empty to distinguish full from empty, so `new(n)`
/// allocates `n + 1` slots and holds at most `n` events.
pub struct ExitQueue {
    slots: Box<[Slot]>,
    read: AtomicUsize,
    write: AtomicUsize,
    dropped: AtomicU64,
}

impl ExitQueue {
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity.max(1) + 1)
            .map(|_| Slot::default())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            read: AtomicUsize::new(0),
            write: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Usable capacity.
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Push an exit event. Returns `false` (and bumps the dropped counter)
    /// when the ring is full. Producer side only.
    pub fn push(&self, pid: u32, exit_code: i32, timestamp: u64) -> bool {
        let w = self.write.load(Ordering::Relaxed);
        let next = (w + 1) % self.slots.len();
        if next == self.read.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        // Index is always in range: `w` only ever holds values previously
        // stored modulo slots.len().
        if let Some(slot) = self.slots.get(w) {
            slot.pid.store(pid, Ordering::Relaxed);
            slot.exit_code.store(exit_code, Ordering::Relaxed);
            slot.timestamp.store(timestamp, Ordering::Relaxed);
        }
        self.write.store(next, Ordering::Release);
        true
    }

    /// Pop the oldest exit event, if any. Consumer side only.
    pub fn pop(&self) -> Option<ExitEvent> {
        let r = self.read.load(Ordering::Relaxed);
        if r == self.write.load(Ordering::Acquire) {
            return None;
        }
        let event = self.slots.get(r).map(|slot| ExitEvent {
            pid: slot.pid.load(Ordering::Relaxed),
            exit_code: slot.exit_code.load(Ordering::Relaxed),
            timestamp: slot.timestamp.load(Ordering::Relaxed),
        })?;
        self.read.store((r + 1) % self.slots.len(), Ordering::Release);
        Some(event)
    }

    /// Drain everything currently queued, in FIFO order.
    pub fn drain(&self) -> Vec<ExitEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.pop() {
            events.push(event);
        }
        events
    }

    pub fn is_empty(&self) -> bool {
        self.read.load(Ordering::Acquire) == self.write.load(Ordering::Acquire)
    }

    /// Number of pushes rejected because the ring was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for ExitQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "exit_queue_tests.rs"]
mod tests;
