//! The gate: the single control transfer from user space into the kernel.
//!
//! The gate's interface is deliberately uniform. It accepts one function
//! pointer (the trampoline) and one opaque data pointer (the call packet) and
//! nothing else. Everything operation-specific lives in the trampoline, which
//! is chosen at compile time by the caller.

/// Uniform trampoline signature: packet pointer in, nothing out.
///
/// # Safety
///
/// A trampoline may only be called with a pointer to the exact packet type
/// it was generated for, that packet must be live and fully initialized, and
/// it may be called at most once per packet.
pub type Trampoline = unsafe fn(packet: *mut ());

/// A synchronous, single-shot transfer into privileged execution.
///
/// # Safety
///
/// Implementors must, on every call to [`Gate::transfer`]:
///
/// - invoke `trampoline(packet)` exactly once before returning normally,
/// - not touch the packet except through that invocation,
/// - not return normally if the trampoline unwinds (the panic must be
///   propagated to the caller).
///
/// Stubs read the packet's return slot right after `transfer` returns and
/// rely on these guarantees to never read an unwritten slot.
pub unsafe trait Gate {
    /// Runs `trampoline(packet)` with elevated privilege and returns after it
    /// completes.
    fn transfer(&self, trampoline: Trampoline, packet: *mut ());
}

unsafe impl<G: Gate + ?Sized> Gate for &G {
    fn transfer(&self, trampoline: Trampoline, packet: *mut ()) {
        (**self).transfer(trampoline, packet)
    }
}
