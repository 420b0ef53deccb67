//! Test utilities for gate and heap tests
//!
//! This module provides helper functions and utilities for writing
//! contract and integration tests against the simulated kernel.

use crate::syscall_gate::KernelGate;
use resources::{heap, HeapStats};

/// Creates a gate with the default configuration
pub fn test_gate() -> KernelGate {
    KernelGate::new()
}

/// Runs a test with a live-object quota applied to the calling context
///
/// The previous quota is restored afterwards, even if the closure panics.
///
/// # Example
///
/// ```
/// use sim_kernel::test_utils::with_heap_quota;
/// use resources::heap;
///
/// with_heap_quota(Some(1), || {
///     assert_eq!(heap::quota(), Some(1));
/// });
/// ```
pub fn with_heap_quota<F, R>(limit: Option<u64>, f: F) -> R
where
    F: FnOnce() -> R,
{
    struct Restore(Option<u64>);

    impl Drop for Restore {
        fn drop(&mut self) {
            heap::set_quota(self.0);
        }
    }

    let _restore = Restore(heap::quota());
    heap::set_quota(limit);
    f()
}

/// Snapshot of the calling context's heap ledger
///
/// Tests capture a checkpoint before exercising stubs and check afterwards
/// that every object they created has been destroyed.
#[derive(Debug, Clone, Copy)]
pub struct HeapCheckpoint {
    baseline: HeapStats,
}

impl HeapCheckpoint {
    pub fn capture() -> Self {
        Self {
            baseline: heap::stats(),
        }
    }

    pub fn baseline(&self) -> HeapStats {
        self.baseline
    }

    /// Objects allocated since the checkpoint
    pub fn allocated_since(&self) -> u64 {
        heap::stats().allocated - self.baseline.allocated
    }

    /// Objects released since the checkpoint
    pub fn released_since(&self) -> u64 {
        heap::stats().released - self.baseline.released
    }

    /// Change in live objects since the checkpoint
    pub fn live_delta(&self) -> i64 {
        heap::stats().live as i64 - self.baseline.live as i64
    }

    /// Panics unless the live count is back at the baseline
    pub fn assert_balanced(&self) {
        let now = heap::stats();
        assert_eq!(
            now.live, self.baseline.live,
            "heap not balanced: {} live at checkpoint, {} live now ({} allocated, {} released since)",
            self.baseline.live,
            now.live,
            now.allocated - self.baseline.allocated,
            now.released - self.baseline.released,
        );
    }
}
