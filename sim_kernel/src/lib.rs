//! # Simulated Kernel
//!
//! This crate provides the simulated privileged side of the stub/skeleton
//! call path: the kernel gate and its configuration.
//!
//! ## Purpose
//!
//! The simulated kernel allows testing marshalled calls without hardware:
//! - Runs under `cargo test`
//! - Privilege is tracked per thread, so tests run in parallel safely
//! - Inspectable (gate and heap activity is recorded in audit logs)
//!
//! ## Philosophy
//!
//! **Testability is a first-class design constraint.**
//!
//! This is not a "toy" or "mock" - it enforces the same boundary a real
//! gate does: privileged objects are only reachable while a trampoline runs.

pub mod config;
pub mod syscall_gate;
pub mod test_utils;

pub use config::{ConfigError, GateConfig, HeapConfig, KernelConfig};
pub use syscall_gate::{GateAuditLog, GateEvent, KernelGate};

use resources::heap;

/// Brings up a gate for the calling execution context
///
/// Validates `config`, applies its heap quota and heap audit capacity to the
/// calling context and returns a gate with its audit settings.
pub fn boot(config: &KernelConfig) -> Result<KernelGate, ConfigError> {
    config.validate()?;
    heap::set_quota(config.heap.max_live_objects);
    heap::set_audit_capacity(config.heap.audit_capacity);
    Ok(KernelGate::with_config(config.gate.clone()))
}
