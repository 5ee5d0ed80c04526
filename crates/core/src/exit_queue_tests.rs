// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn push_pop_roundtrip() {
    let queue = ExitQueue::new(4);
    assert!(queue.push(100, 0, 10));
    let event = queue.pop().unwrap();
    assert_eq!(
        event,
        ExitEvent {
            pid: 100,
            exit_code: 0,
            timestamp: 10
        }
    );
    assert!(queue.pop().is_none());
    assert!(queue.is_empty());
}

#[test]
fn fifo_order_preserved() {
    let queue = ExitQueue::new(8);
    for pid in 1..=5 {
        assert!(queue.push(pid, pid as i32, 0));
    }
    let pids: Vec<u32> = queue.drain().iter().map(|e| e.pid).collect();
    assert_eq!(pids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn full_ring_drops_and_counts() {
    let queue = ExitQueue::new(3);
    assert!(queue.push(1, 0, 0));
    assert!(queue.push(2, 0, 0));
    assert!(queue.push(3, 0, 0));
    // Ring holds exactly `capacity` events; the overflow is counted.
    assert!(!queue.push(4, 0, 0));
    assert!(!queue.push(5, 0, 0));
    assert_eq!(queue.dropped(), 2);

    // Queued events are intact and in order.
    let pids: Vec<u32> = queue.drain().iter().map(|e| e.pid).collect();
    assert_eq!(pids, vec![1, 2, 3]);
}

#[test]
fn no_loss_when_never_full() {
    let queue = ExitQueue::new(4);
    let mut popped = 0;
    // 100 children exit, consumer keeps up: exactly 100 pops, zero drops.
    for round in 0..25u32 {
        for i in 0..4u32 {
            assert!(queue.push(round * 4 + i, 0, 0));
        }
        popped += queue.drain().len();
    }
    assert_eq!(popped, 100);
    assert_eq!(queue.dropped(), 0);
}

#[test]
fn ring_wraps_around() {
    let queue = ExitQueue::new(2);
    for pid in 0..10 {
        assert!(queue.push(pid, 0, 0));
        assert_eq!(queue.pop().unwrap().pid, pid);
    }
    assert_eq!(queue.dropped(), 0);
}

#[test]
fn capacity_reports_usable_slots() {
    assert_eq!(ExitQueue::new(64).capacity(), 64);
    assert_eq!(ExitQueue::default().capacity(), DEFAULT_CAPACITY);
    // Degenerate request still yields a working one-slot queue.
    let tiny = ExitQueue::new(0);
    assert_eq!(tiny.capacity(), 1);
    assert!(tiny.push(1, 0, 0));
    assert!(!tiny.push(2, 0, 0));
}

#[test]
fn concurrent_producer_consumer() {
    use std::sync::Arc;

    let queue = Arc::new(ExitQueue::new(64));
    let producer_queue = Arc::clone(&queue);
    let producer = std::thread::spawn(move || {
        let mut pushed = 0u64;
        for pid in 0..10_000u32 {
            if producer_queue.push(pid, 0, 0) {
                pushed += 1;
            }
        }
        pushed
    });

    let mut seen: Vec<u32> = Vec::new();
    while seen.len() as u64 + queue.dropped() < 10_000 {
        if let Some(event) = queue.pop() {
            seen.push(event.pid);
        } else {
            std::thread::yield_now();
        }
    }
    let pushed = producer.join().unwrap();

    // Every successfully pushed event is popped exactly once, in order.
    assert_eq!(seen.len() as u64, pushed);
    assert_eq!(pushed + queue.dropped(), 10_000);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}
