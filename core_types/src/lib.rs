//! # Core Types
//!
//! This crate defines the fundamental types shared by both sides of the
//! kernel gate.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: User space names privileged objects only
//!   through typed handles.
//! - **Type safety first**: Mutating and read-only access are different types,
//!   so the distinction is settled at compile time.
//! - **No ambient authority**: A handle grants nothing until it crosses the gate.
//!
//! ## Key Types
//!
//! - [`Handle<T>`]: Opaque reference to a privileged object
//! - [`Exclusive<T>`] / [`Shared<T>`]: Receiver views for instance operations
//! - [`ObjectId`]: Unique identifier for privileged objects
//! - [`CallId`]: Unique identifier for a gate transfer

pub mod handle;
pub mod ids;

pub use handle::{Exclusive, Handle, Shared};
pub use ids::{CallId, ObjectId};
