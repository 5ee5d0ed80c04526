// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_is_monotonic_enough() {
    let clock = SystemClock;
    let a = clock.epoch_us();
    let b = clock.epoch_us();
    assert!(b >= a);
    // Sanity: we are past 2020 and before 2100.
    assert!(clock.epoch_secs() > 1_577_836_800);
    assert!(clock.epoch_secs() < 4_102_444_800);
}

#[test]
fn unit_conversions() {
    let clock = FakeClock::at_epoch_secs(12);
    assert_eq!(clock.epoch_us(), 12_000_000);
    assert_eq!(clock.epoch_ms(), 12_000);
    assert_eq!(clock.epoch_secs(), 12);
}

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::at_epoch_secs(100);
    clock.advance_secs(5);
    assert_eq!(clock.epoch_secs(), 105);
    clock.advance_us(999_999);
    assert_eq!(clock.epoch_secs(), 105);
    clock.advance_us(1);
    assert_eq!(clock.epoch_secs(), 106);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::at_epoch_secs(50);
    let other = clock.clone();
    clock.advance_secs(10);
    assert_eq!(other.epoch_secs(), 60);
}
