//! Counter scenario contract tests
//!
//! A counter constructed through a stub, incremented twice and read back.

#[cfg(test)]
mod tests {
    use crate::test_helpers::*;
    use sim_kernel::test_utils::{test_gate, HeapCheckpoint};

    #[test]
    fn test_counter_scenario() {
        let gate = test_gate();
        let checkpoint = HeapCheckpoint::capture();

        let mut counter = CounterStub::new(&gate).unwrap();
        counter.increment(5);
        counter.increment(3);
        assert_eq!(counter.value(), 8);
        assert_eq!(checkpoint.live_delta(), 1);

        drop(counter);
        checkpoint.assert_balanced();
        assert_eq!(checkpoint.allocated_since(), 1);
        assert_eq!(checkpoint.released_since(), 1);
    }

    #[test]
    fn test_mutating_calls_observe_each_other_in_order() {
        let gate = test_gate();
        let mut register = RegisterStub::with_total(&gate, 2).unwrap();

        // (2 * 3 + 1) then (7 * 2 + 0): reordering would give a different total
        assert_eq!(register.scale_add(3, 1), 7);
        assert_eq!(register.scale_add(2, 0), 14);
        assert_eq!(register.total(), 14);
    }

    #[test]
    fn test_round_trip_with_read_only_call_does_not_leak() {
        let gate = test_gate();
        let checkpoint = HeapCheckpoint::capture();

        {
            let counter = CounterStub::new(&gate).unwrap();
            assert_eq!(counter.value(), 0);
        }

        checkpoint.assert_balanced();
        assert_eq!(checkpoint.released_since(), 1);
    }

    #[test]
    fn test_independent_stubs_do_not_share_state() {
        let gate = test_gate();
        let mut first = CounterStub::new(&gate).unwrap();
        let mut second = CounterStub::new(&gate).unwrap();

        first.increment(1);
        second.increment(10);

        assert_eq!(first.value(), 1);
        assert_eq!(second.value(), 10);
        assert_ne!(first.object_id(), second.object_id());
    }
}
