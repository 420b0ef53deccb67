//! # Stub/Skeleton Call Marshalling
//!
//! User code calls privileged objects and functions through generated stubs.
//! A stub packs the call into a [`CallPacket`](packet::CallPacket), hands the
//! packet and a compile-time selected trampoline to a [`Gate`], and unpacks
//! the result once the gate returns. The trampoline belongs to a skeleton:
//! it runs with kernel privilege, unpacks the packet and performs exactly one
//! operation.
//!
//! ## Philosophy
//!
//! - **No dispatch tables**: every operation has its own trampoline, chosen
//!   by the type system when the stub is generated
//! - **Mutability is preserved**: read-only operations receive a
//!   [`Shared`] receiver and cannot mutate the object
//! - **The gate is opaque**: this crate only requires the [`Gate`] contract
//! - **Failures are values**: construction reports quota or privilege
//!   failures as [`KernelError`]
//!
//! ## Layers
//!
//! - [`tuple`]: applies packed arguments to a function
//! - [`packet`]: call packet layouts
//! - [`skeleton`] / [`function_skeleton`]: privileged-side adapters
//! - [`stub`]: [`Proxy`], [`stub!`] and [`function_stub!`]

pub mod function_skeleton;
pub mod packet;
pub mod skeleton;
pub mod stub;
pub mod tuple;

pub use core_types::{Exclusive, Handle, ObjectId, Shared};
pub use function_skeleton::{Function, FunctionSkeleton, VoidFunctionSkeleton};
pub use kernel_api::{Gate, KernelError, Trampoline};
pub use skeleton::{
    ConstMethod, ConstSkeleton, ConstVoidSkeleton, Construct, ConstructSkeleton,
    DestructorSkeleton, Method, Skeleton, VoidSkeleton,
};
pub use stub::Proxy;
