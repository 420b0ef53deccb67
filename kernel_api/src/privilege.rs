//! Privilege levels of an execution context.
//!
//! Every execution context (a thread, in simulation) starts in
//! [`PrivilegeLevel::User`]. Only a gate raises it to
//! [`PrivilegeLevel::Kernel`], and only for the duration of a transfer.
//! Privileged facilities such as the kernel heap check the current level
//! before doing anything.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;

/// Privilege level of the current execution context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrivilegeLevel {
    /// Restricted component
    User,
    /// Kernel-resident code reached through the gate
    Kernel,
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivilegeLevel::User => write!(f, "user"),
            PrivilegeLevel::Kernel => write!(f, "kernel"),
        }
    }
}

thread_local! {
    static LEVEL: Cell<PrivilegeLevel> = const { Cell::new(PrivilegeLevel::User) };
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Returns the privilege level of the calling context
pub fn current() -> PrivilegeLevel {
    LEVEL.with(|level| level.get())
}

/// Returns true if the calling context runs with kernel privilege
pub fn is_kernel() -> bool {
    current() == PrivilegeLevel::Kernel
}

/// Returns how many gate transfers are currently nested in this context
pub fn depth() -> u32 {
    DEPTH.with(|depth| depth.get())
}

/// Raises the calling context to kernel privilege.
///
/// The previous level is restored when the returned guard is dropped,
/// including while unwinding. Intended for gate implementations only.
pub fn elevate() -> PrivilegeGuard {
    let previous = LEVEL.with(|level| level.replace(PrivilegeLevel::Kernel));
    DEPTH.with(|depth| depth.set(depth.get() + 1));
    PrivilegeGuard {
        previous,
        _not_send: std::marker::PhantomData,
    }
}

/// Restores the previous privilege level on drop
#[must_use = "privilege drops back as soon as the guard is dropped"]
pub struct PrivilegeGuard {
    previous: PrivilegeLevel,
    _not_send: std::marker::PhantomData<*const ()>,
}

impl PrivilegeGuard {
    /// Level that will be restored when this guard is dropped
    pub fn previous(&self) -> PrivilegeLevel {
        self.previous
    }
}

impl Drop for PrivilegeGuard {
    fn drop(&mut self) {
        LEVEL.with(|level| level.set(self.previous));
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
