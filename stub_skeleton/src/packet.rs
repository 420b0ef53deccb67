//! Call packets: the data that crosses the gate.
//!
//! A packet carries three things: the argument tuple, the receiver (if the
//! operation has one) and the return storage (if the operation is non-void).
//! The concrete layout is picked by the skeleton that owns the packet type, so
//! a stub can only ever hand a trampoline the layout it was generated for.
//!
//! Packets live on the calling stub's stack for the duration of one gate
//! transfer and are never retained.

use std::mem::{ManuallyDrop, MaybeUninit};

/// Return storage of a non-void operation
///
/// Written once by the trampoline, read once by the stub after the gate
/// returns.
pub struct Slot<R>(MaybeUninit<R>);

/// Return storage shapes: [`Slot<R>`] for non-void operations, `()` for void
/// operations (no slot in the layout, nothing to read).
pub trait ReturnStorage {
    fn empty() -> Self;
}

impl<R> ReturnStorage for Slot<R> {
    fn empty() -> Self {
        Slot(MaybeUninit::uninit())
    }
}

impl ReturnStorage for () {
    fn empty() -> Self {}
}

/// One invocation's worth of data
///
/// - `A`: argument tuple
/// - `Rx`: receiver ([`Exclusive`](core_types::Exclusive),
///   [`Shared`](core_types::Shared), `Option<Handle<T>>` or `()`)
/// - `S`: return storage ([`Slot<R>`] or `()`)
#[repr(C)]
pub struct CallPacket<A, Rx, S> {
    args: ManuallyDrop<A>,
    receiver: Rx,
    ret: S,
}

impl<A, Rx, S: ReturnStorage> CallPacket<A, Rx, S> {
    /// Builds a packet with an empty return slot
    pub fn new(args: A, receiver: Rx) -> Self {
        Self {
            args: ManuallyDrop::new(args),
            receiver,
            ret: S::empty(),
        }
    }
}

impl<A, Rx, S> CallPacket<A, Rx, S> {
    /// Erased address handed to the gate
    pub fn as_mut_ptr(&mut self) -> *mut () {
        self as *mut Self as *mut ()
    }

    /// Recovers a packet from the address the gate delivered.
    ///
    /// # Safety
    ///
    /// `data` must be the address of a live `CallPacket<A, Rx, S>` with
    /// exactly these type parameters.
    pub(crate) unsafe fn from_raw<'a>(data: *mut ()) -> &'a mut Self {
        &mut *(data as *mut Self)
    }

    pub(crate) fn receiver(&self) -> &Rx {
        &self.receiver
    }

    pub(crate) fn receiver_mut(&mut self) -> &mut Rx {
        &mut self.receiver
    }

    /// Moves the arguments out.
    ///
    /// # Safety
    ///
    /// Must be called at most once per packet.
    pub(crate) unsafe fn take_args(&mut self) -> A {
        ManuallyDrop::take(&mut self.args)
    }
}

impl<A, Rx, R> CallPacket<A, Rx, Slot<R>> {
    pub(crate) fn store(&mut self, value: R) {
        self.ret.0.write(value);
    }

    /// Extracts the return value.
    ///
    /// # Safety
    ///
    /// The slot must have been written, i.e. the packet's trampoline ran to
    /// completion through a conforming [`Gate`](kernel_api::Gate).
    pub unsafe fn into_return(self) -> R {
        self.ret.0.assume_init()
    }
}
