//! Kernel error types

use thiserror::Error;

/// Errors raised by the simulated kernel's privileged facilities
///
/// The marshalling layer never produces these itself; it only carries them
/// back to the caller, unchanged, when a privileged facility fails.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KernelError {
    /// A privileged facility was used outside the gate
    #[error("Privileged operation attempted without kernel privilege: {0}")]
    Unprivileged(String),

    /// The kernel heap refused an allocation
    #[error("Kernel heap exhausted: {live} of {limit} objects live")]
    HeapExhausted { limit: u64, live: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = KernelError::HeapExhausted { limit: 2, live: 2 };
        assert_eq!(err.to_string(), "Kernel heap exhausted: 2 of 2 objects live");

        let err = KernelError::Unprivileged("allocate".to_string());
        assert!(err.to_string().contains("allocate"));
    }
}
