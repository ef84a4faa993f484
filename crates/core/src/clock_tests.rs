// SPDX-License-Identifier: MIT

use super::*;
use std::time::Duration;

#[test]
fn fake_clock_reports_fixed_epoch() {
    let clock = FakeClock::new(1_000_000);
    assert_eq!(clock.epoch_ms(), 1_000_000);
    assert_eq!(clock.epoch_secs(), 1_000);
}

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new(0);
    clock.advance(Duration::from_secs(5));
    assert_eq!(clock.epoch_ms(), 5_000);
}

#[test]
fn fake_clock_set_epoch_ms() {
    let clock = FakeClock::default();
    clock.set_epoch_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
}

#[test]
fn system_clock_is_nonzero() {
    let clock = SystemClock;
    assert!(clock.epoch_ms() > 0);
}
