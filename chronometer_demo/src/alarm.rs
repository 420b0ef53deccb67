//! Alarm timer: privileged delay and frequency queries
//!
//! The timer ticks at [`FREQUENCY`]; delays are rounded to the nearest tick.

use crate::clock::{self, Microsecond};

/// Timer frequency in ticks per second
pub type Hertz = u32;

pub const FREQUENCY: Hertz = 1000;

pub fn frequency() -> Hertz {
    FREQUENCY
}

/// Length of one tick
pub fn period() -> Microsecond {
    1_000_000 / Microsecond::from(frequency())
}

/// Number of ticks nearest to `time`
pub fn ticks(time: Microsecond) -> u64 {
    let period = period();
    time.saturating_add(period / 2) / period
}

/// Waits for `time`, rounded to whole ticks
pub fn delay(time: Microsecond) {
    clock::advance(ticks(time).saturating_mul(period()));
}
