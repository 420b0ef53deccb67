//! # Chronometer Demo
//!
//! A stopwatch that lives in the kernel heap, driven from user code through
//! generated stubs. The privileged side owns a simulated clock and an alarm
//! timer; the user side only ever holds a [`ChronometerStub`].

pub mod alarm;
pub mod chronometer;
pub mod clock;

pub use alarm::Hertz;
pub use chronometer::Chronometer;
pub use clock::Microsecond;

use kernel_api::KernelError;
use serde::{Deserialize, Serialize};
use sim_kernel::ConfigError;
use stub_skeleton::{function_stub, stub, Gate};
use thiserror::Error;

stub! {
    /// User-side proxy for [`Chronometer`]
    pub struct ChronometerStub for Chronometer;

    construct fn new();
    fn start(&mut self);
    fn stop(&mut self);
    fn reset(&mut self);
    fn read(&self) -> Microsecond;
    fn is_running(&self) -> bool;
}

function_stub! {
    /// Delays the calling context by `time` microseconds
    pub fn delay(time: Microsecond) = alarm::delay;

    /// Alarm timer frequency
    pub fn frequency() -> Hertz = alarm::frequency;
}

/// Demo errors
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),
}

/// Outcome of one timed delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub requested_us: Microsecond,
    pub elapsed_us: Microsecond,
    pub frequency_hz: Hertz,
}

/// Times a delay of `delay_us` with a kernel-resident chronometer
pub fn measure<G: Gate + ?Sized>(
    gate: &G,
    delay_us: Microsecond,
) -> Result<Measurement, DemoError> {
    let mut timepiece = ChronometerStub::new(gate)?;

    timepiece.start();
    delay(gate, delay_us);
    timepiece.stop();

    Ok(Measurement {
        requested_us: delay_us,
        elapsed_us: timepiece.read(),
        frequency_hz: frequency(gate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_api::privilege;
    use resources::heap;
    use sim_kernel::test_utils::{test_gate, with_heap_quota, HeapCheckpoint};

    #[test]
    fn test_measure_reports_delay() {
        let gate = test_gate();
        let checkpoint = HeapCheckpoint::capture();

        let measurement = measure(&gate, 1_500_000).unwrap();

        assert_eq!(measurement.elapsed_us, 1_500_000);
        assert_eq!(measurement.frequency_hz, alarm::FREQUENCY);
        checkpoint.assert_balanced();
        // construct, start, delay, stop, read, frequency, destroy
        assert_eq!(gate.transfer_count(), 7);
    }

    #[test]
    fn test_stub_matches_direct_chronometer() {
        let gate = test_gate();
        let mut stub = ChronometerStub::new(&gate).unwrap();
        let mut direct = Chronometer::new();

        stub.start();
        direct.start();
        assert_eq!(stub.is_running(), direct.is_running());

        delay(&gate, 2_000);
        stub.stop();
        direct.stop();
        assert_eq!(stub.read(), direct.read());
        assert_eq!(stub.read(), 2_000);

        stub.reset();
        direct.reset();
        assert_eq!(stub.read(), direct.read());
        assert!(!stub.is_running());
    }

    #[test]
    fn test_measure_surfaces_quota_failure() {
        let gate = test_gate();
        let result = with_heap_quota(Some(heap::stats().live), || measure(&gate, 10));
        assert!(matches!(
            result,
            Err(DemoError::Kernel(KernelError::HeapExhausted { .. }))
        ));
    }

    #[test]
    fn test_delay_runs_privileged_but_returns_to_user() {
        let gate = test_gate();
        delay(&gate, 1_000);
        assert!(!privilege::is_kernel());
    }

    #[test]
    fn test_measurement_serializes() {
        let measurement = Measurement {
            requested_us: 10,
            elapsed_us: 10,
            frequency_hz: 1000,
        };
        let json = serde_json::to_string(&measurement).unwrap();
        assert_eq!(
            json,
            r#"{"requested_us":10,"elapsed_us":10,"frequency_hz":1000}"#
        );
    }
}
