//! Privileged stopwatch over the simulated clock

use crate::clock::{self, Microsecond};

/// Stopwatch measuring elapsed simulated time
///
/// Time accumulates across start/stop cycles until [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct Chronometer {
    started_at: Option<Microsecond>,
    accumulated: Microsecond,
}

impl Chronometer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts measuring; no effect if already running
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(clock::now());
        }
    }

    /// Stops measuring; no effect if not running
    pub fn stop(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.accumulated += clock::now() - started_at;
        }
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.accumulated = 0;
    }

    /// Elapsed time, including the current run if running
    pub fn read(&self) -> Microsecond {
        let running = self
            .started_at
            .map_or(0, |started_at| clock::now() - started_at);
        self.accumulated + running
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measures_elapsed_time() {
        let mut chronometer = Chronometer::new();
        chronometer.start();
        clock::advance(300);
        chronometer.stop();
        clock::advance(1_000);
        assert_eq!(chronometer.read(), 300);
        assert!(!chronometer.is_running());
    }

    #[test]
    fn test_read_while_running() {
        let mut chronometer = Chronometer::new();
        chronometer.start();
        clock::advance(40);
        assert!(chronometer.is_running());
        assert_eq!(chronometer.read(), 40);
    }

    #[test]
    fn test_accumulates_and_resets() {
        let mut chronometer = Chronometer::new();
        chronometer.start();
        clock::advance(10);
        chronometer.stop();
        chronometer.start();
        chronometer.start();
        clock::advance(5);
        chronometer.stop();
        assert_eq!(chronometer.read(), 15);

        chronometer.reset();
        assert_eq!(chronometer.read(), 0);
    }
}
