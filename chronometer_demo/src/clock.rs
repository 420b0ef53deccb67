//! Simulated time source
//!
//! Each execution context has its own clock, starting at zero. Time only
//! moves when something advances it, which keeps every run deterministic.

use std::cell::Cell;

/// Time in microseconds
pub type Microsecond = u64;

thread_local! {
    static NOW: Cell<Microsecond> = const { Cell::new(0) };
}

/// Current time of the calling context
pub fn now() -> Microsecond {
    NOW.with(|now| now.get())
}

/// Moves the calling context's clock forward
pub fn advance(time: Microsecond) {
    NOW.with(|now| now.set(now.get().saturating_add(time)));
}
