//! FunctionSkeleton family: privileged-side adapters for free functions.
//!
//! Same shape as the method skeletons without a receiver: the packet holds
//! the argument tuple and, for non-void functions, a return slot.

use crate::packet::{CallPacket, Slot};
use kernel_api::{Gate, Trampoline};
use std::marker::PhantomData;

/// A free function bound at compile time
pub trait Function {
    type Args;
    type Output;

    fn call(args: Self::Args) -> Self::Output;
}

type FunctionPacket<F> = CallPacket<<F as Function>::Args, (), Slot<<F as Function>::Output>>;
type VoidFunctionPacket<F> = CallPacket<<F as Function>::Args, (), ()>;

/// Non-void free function
pub struct FunctionSkeleton<F>(PhantomData<F>);

impl<F: Function> FunctionSkeleton<F> {
    pub const TRAMPOLINE: Trampoline = Self::trampoline;

    unsafe fn trampoline(data: *mut ()) {
        let packet = FunctionPacket::<F>::from_raw(data);
        let args = packet.take_args();
        packet.store(F::call(args));
    }

    pub fn invoke<G: Gate + ?Sized>(gate: &G, args: F::Args) -> F::Output {
        let mut packet = FunctionPacket::<F>::new(args, ());
        gate.transfer(Self::TRAMPOLINE, packet.as_mut_ptr());
        // SAFETY: a conforming gate ran the trampoline, which wrote the slot.
        unsafe { packet.into_return() }
    }
}

/// Void free function
pub struct VoidFunctionSkeleton<F>(PhantomData<F>);

impl<F: Function<Output = ()>> VoidFunctionSkeleton<F> {
    pub const TRAMPOLINE: Trampoline = Self::trampoline;

    unsafe fn trampoline(data: *mut ()) {
        let packet = VoidFunctionPacket::<F>::from_raw(data);
        F::call(packet.take_args());
    }

    pub fn invoke<G: Gate + ?Sized>(gate: &G, args: F::Args) {
        let mut packet = VoidFunctionPacket::<F>::new(args, ());
        gate.transfer(Self::TRAMPOLINE, packet.as_mut_ptr());
    }
}
