//! # Kernel API
//!
//! This crate defines the interface between user-space code and the kernel
//! for invoking operations on privileged objects.
//!
//! ## Philosophy
//!
//! The kernel provides **mechanisms**, not policies:
//! - One uniform control transfer (the [`Gate`]), not a syscall per operation
//! - Explicit privilege levels, raised only by the gate
//! - Typed failures for the privileged facilities
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A serialization format (the call packet is addressed directly)
//! - An asynchronous or batched call interface
//! - A dispatch table looked up at run time

pub mod error;
pub mod gate;
pub mod privilege;

pub use error::KernelError;
pub use gate::{Gate, Trampoline};
pub use privilege::{PrivilegeGuard, PrivilegeLevel};
