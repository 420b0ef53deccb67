//! # Resources
//!
//! This crate provides the kernel heap: the privileged allocator that owns
//! the storage of every kernel-resident object.
//!
//! ## Philosophy
//!
//! - **Privileged objects are allocated by the kernel only**
//! - **Budgets are enforced, not advisory**
//! - **Accounting is deterministic and testable**
//! - **Simulation-first** (objects live in the host process)
//!
//! ## Core Concepts
//!
//! - [`heap::allocate_with`] / [`heap::release`]: object lifetime
//! - [`HeapStats`]: live / allocated / released counts per execution context
//! - Quota: an optional cap on live objects per execution context
//! - [`HeapAuditLog`]: ordered record of heap events
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A general-purpose allocator (it defers to the host allocator)
//! - A lifetime policy (callers decide when to release)
//! - Global mutable counters shared across contexts

pub mod audit;
pub mod heap;

pub use audit::{HeapAuditEntry, HeapAuditLog, HeapEvent};
pub use heap::HeapStats;
