//! Skeleton family: privileged-side adapters for instance methods,
//! constructors and destructors.
//!
//! An operation is named by a zero-sized binding type implementing
//! [`Method`], [`ConstMethod`] or [`Construct`]. Each skeleton is generic over
//! that binding, so every operation gets its own monomorphized trampoline and
//! its own packet layout:
//!
//! | Skeleton | Receiver | Return slot |
//! |---|---|---|
//! | [`Skeleton<M>`] | `Exclusive<T>` | `Slot<R>` |
//! | [`VoidSkeleton<M>`] | `Exclusive<T>` | none |
//! | [`ConstSkeleton<M>`] | `Shared<T>` | `Slot<R>` |
//! | [`ConstVoidSkeleton<M>`] | `Shared<T>` | none |
//! | [`ConstructSkeleton<C>`] | none | `Slot<Result<Handle<T>, KernelError>>` |
//! | [`DestructorSkeleton<T>`] | `Option<Handle<T>>` | none |
//!
//! `TRAMPOLINE` is the address handed to the gate; `invoke` is the client
//! side of the same pair: it builds the packet type the trampoline expects,
//! transfers, and extracts the result.

use crate::packet::{CallPacket, Slot};
use core_types::{Exclusive, Handle, Shared};
use kernel_api::{Gate, KernelError, Trampoline};
use resources::heap;
use std::marker::PhantomData;

/// A mutating instance operation bound at compile time
pub trait Method {
    type Object;
    type Args;
    type Output;

    fn call(object: &mut Self::Object, args: Self::Args) -> Self::Output;
}

/// A read-only instance operation bound at compile time
pub trait ConstMethod {
    type Object;
    type Args;
    type Output;

    fn call(object: &Self::Object, args: Self::Args) -> Self::Output;
}

/// A constructor bound at compile time
pub trait Construct {
    type Object;
    type Args;

    fn construct(args: Self::Args) -> Self::Object;
}

type MethodPacket<'a, M> = CallPacket<
    <M as Method>::Args,
    Exclusive<'a, <M as Method>::Object>,
    Slot<<M as Method>::Output>,
>;
type VoidMethodPacket<'a, M> =
    CallPacket<<M as Method>::Args, Exclusive<'a, <M as Method>::Object>, ()>;
type ConstMethodPacket<'a, M> = CallPacket<
    <M as ConstMethod>::Args,
    Shared<'a, <M as ConstMethod>::Object>,
    Slot<<M as ConstMethod>::Output>,
>;
type ConstVoidMethodPacket<'a, M> =
    CallPacket<<M as ConstMethod>::Args, Shared<'a, <M as ConstMethod>::Object>, ()>;
type ConstructPacket<C> = CallPacket<
    <C as Construct>::Args,
    (),
    Slot<Result<Handle<<C as Construct>::Object>, KernelError>>,
>;
type DestroyPacket<T> = CallPacket<(), Option<Handle<T>>, ()>;

/// Mutating, non-void instance operation
pub struct Skeleton<M>(PhantomData<M>);

impl<M: Method> Skeleton<M> {
    pub const TRAMPOLINE: Trampoline = Self::trampoline;

    unsafe fn trampoline(data: *mut ()) {
        let packet = MethodPacket::<'_, M>::from_raw(data);
        let object = packet.receiver().get_mut();
        let args = packet.take_args();
        packet.store(M::call(object, args));
    }

    pub fn invoke<G: Gate + ?Sized>(
        gate: &G,
        receiver: Exclusive<'_, M::Object>,
        args: M::Args,
    ) -> M::Output {
        let mut packet = MethodPacket::<'_, M>::new(args, receiver);
        gate.transfer(Self::TRAMPOLINE, packet.as_mut_ptr());
        // SAFETY: a conforming gate ran the trampoline, which wrote the slot.
        unsafe { packet.into_return() }
    }
}

/// Mutating, void instance operation
pub struct VoidSkeleton<M>(PhantomData<M>);

impl<M: Method<Output = ()>> VoidSkeleton<M> {
    pub const TRAMPOLINE: Trampoline = Self::trampoline;

    unsafe fn trampoline(data: *mut ()) {
        let packet = VoidMethodPacket::<'_, M>::from_raw(data);
        let object = packet.receiver().get_mut();
        M::call(object, packet.take_args());
    }

    pub fn invoke<G: Gate + ?Sized>(gate: &G, receiver: Exclusive<'_, M::Object>, args: M::Args) {
        let mut packet = VoidMethodPacket::<'_, M>::new(args, receiver);
        gate.transfer(Self::TRAMPOLINE, packet.as_mut_ptr());
    }
}

/// Read-only, non-void instance operation
pub struct ConstSkeleton<M>(PhantomData<M>);

impl<M: ConstMethod> ConstSkeleton<M> {
    pub const TRAMPOLINE: Trampoline = Self::trampoline;

    unsafe fn trampoline(data: *mut ()) {
        let packet = ConstMethodPacket::<'_, M>::from_raw(data);
        let object = packet.receiver().get();
        let args = packet.take_args();
        packet.store(M::call(object, args));
    }

    pub fn invoke<G: Gate + ?Sized>(
        gate: &G,
        receiver: Shared<'_, M::Object>,
        args: M::Args,
    ) -> M::Output {
        let mut packet = ConstMethodPacket::<'_, M>::new(args, receiver);
        gate.transfer(Self::TRAMPOLINE, packet.as_mut_ptr());
        // SAFETY: a conforming gate ran the trampoline, which wrote the slot.
        unsafe { packet.into_return() }
    }
}

/// Read-only, void instance operation
pub struct ConstVoidSkeleton<M>(PhantomData<M>);

impl<M: ConstMethod<Output = ()>> ConstVoidSkeleton<M> {
    pub const TRAMPOLINE: Trampoline = Self::trampoline;

    unsafe fn trampoline(data: *mut ()) {
        let packet = ConstVoidMethodPacket::<'_, M>::from_raw(data);
        let object = packet.receiver().get();
        M::call(object, packet.take_args());
    }

    pub fn invoke<G: Gate + ?Sized>(gate: &G, receiver: Shared<'_, M::Object>, args: M::Args) {
        let mut packet = ConstVoidMethodPacket::<'_, M>::new(args, receiver);
        gate.transfer(Self::TRAMPOLINE, packet.as_mut_ptr());
    }
}

/// Construction: allocates a new privileged object in the kernel heap
///
/// The new handle is written to an output slot of its own rather than to the
/// receiver position. Allocation failure is written there too and reaches
/// the caller unchanged.
pub struct ConstructSkeleton<C>(PhantomData<C>);

impl<C: Construct> ConstructSkeleton<C> {
    pub const TRAMPOLINE: Trampoline = Self::trampoline;

    unsafe fn trampoline(data: *mut ()) {
        let packet = ConstructPacket::<C>::from_raw(data);
        let args = packet.take_args();
        packet.store(heap::allocate_with(|| C::construct(args)));
    }

    pub fn invoke<G: Gate + ?Sized>(
        gate: &G,
        args: C::Args,
    ) -> Result<Handle<C::Object>, KernelError> {
        let mut packet = ConstructPacket::<C>::new(args, ());
        gate.transfer(Self::TRAMPOLINE, packet.as_mut_ptr());
        // SAFETY: a conforming gate ran the trampoline, which wrote the slot.
        unsafe { packet.into_return() }
    }
}

/// Destruction: one fixed trampoline per object type
pub struct DestructorSkeleton<T>(PhantomData<T>);

impl<T> DestructorSkeleton<T> {
    pub const TRAMPOLINE: Trampoline = Self::trampoline;

    unsafe fn trampoline(data: *mut ()) {
        let packet = DestroyPacket::<T>::from_raw(data);
        // A packet already emptied has nothing left to release.
        if let Some(handle) = packet.receiver_mut().take() {
            heap::release(handle);
        }
    }

    pub fn invoke<G: Gate + ?Sized>(gate: &G, handle: Handle<T>) {
        let mut packet = DestroyPacket::<T>::new((), Some(handle));
        gate.transfer(Self::TRAMPOLINE, packet.as_mut_ptr());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::{Apply, ApplyTo};
    use kernel_api::privilege;
    use std::cell::Cell;

    /// Minimal conforming gate for unit tests.
    struct LoopbackGate {
        transfers: Cell<u32>,
    }

    impl LoopbackGate {
        fn new() -> Self {
            Self {
                transfers: Cell::new(0),
            }
        }
    }

    unsafe impl Gate for LoopbackGate {
        fn transfer(&self, trampoline: Trampoline, packet: *mut ()) {
            self.transfers.set(self.transfers.get() + 1);
            let _guard = privilege::elevate();
            unsafe { trampoline(packet) }
        }
    }

    struct Meter {
        reading: u32,
        resets: Cell<u32>,
    }

    impl Meter {
        fn new(reading: u32) -> Self {
            Self {
                reading,
                resets: Cell::new(0),
            }
        }

        fn advance(&mut self, by: u32) -> u32 {
            self.reading += by;
            self.reading
        }

        fn zero(&mut self) {
            self.reading = 0;
        }

        fn read(&self) -> u32 {
            self.reading
        }

        fn note_reset(&self) {
            self.resets.set(self.resets.get() + 1);
        }
    }

    struct NewMeter;
    impl Construct for NewMeter {
        type Object = Meter;
        type Args = (u32,);
        fn construct(args: (u32,)) -> Meter {
            args.apply(Meter::new)
        }
    }

    struct Advance;
    impl Method for Advance {
        type Object = Meter;
        type Args = (u32,);
        type Output = u32;
        fn call(object: &mut Meter, args: (u32,)) -> u32 {
            args.apply_to(object, Meter::advance)
        }
    }

    struct Zero;
    impl Method for Zero {
        type Object = Meter;
        type Args = ();
        type Output = ();
        fn call(object: &mut Meter, args: ()) {
            args.apply_to(object, Meter::zero)
        }
    }

    struct Read;
    impl ConstMethod for Read {
        type Object = Meter;
        type Args = ();
        type Output = u32;
        fn call(object: &Meter, args: ()) -> u32 {
            args.apply_to(object, Meter::read)
        }
    }

    struct NoteReset;
    impl ConstMethod for NoteReset {
        type Object = Meter;
        type Args = ();
        type Output = ();
        fn call(object: &Meter, args: ()) {
            args.apply_to(object, Meter::note_reset)
        }
    }

    #[test]
    fn test_full_lifecycle_through_skeletons() {
        let gate = LoopbackGate::new();
        let before = heap::stats();

        let mut handle = ConstructSkeleton::<NewMeter>::invoke(&gate, (10,)).unwrap();
        assert_eq!(heap::stats().live, before.live + 1);

        assert_eq!(Skeleton::<Advance>::invoke(&gate, handle.exclusive(), (5,)), 15);
        assert_eq!(ConstSkeleton::<Read>::invoke(&gate, handle.shared(), ()), 15);

        VoidSkeleton::<Zero>::invoke(&gate, handle.exclusive(), ());
        ConstVoidSkeleton::<NoteReset>::invoke(&gate, handle.shared(), ());
        assert_eq!(ConstSkeleton::<Read>::invoke(&gate, handle.shared(), ()), 0);

        DestructorSkeleton::<Meter>::invoke(&gate, handle);
        assert_eq!(heap::stats().live, before.live);
        assert_eq!(gate.transfers.get(), 7);
    }

    #[test]
    fn test_construct_surfaces_allocation_failure() {
        let gate = LoopbackGate::new();
        heap::set_quota(Some(0));

        let result = ConstructSkeleton::<NewMeter>::invoke(&gate, (1,));
        assert!(matches!(result, Err(KernelError::HeapExhausted { limit: 0, .. })));

        heap::set_quota(None);
    }

    #[test]
    fn test_destructor_trampoline_releases_once() {
        let before = heap::stats();
        let handle = {
            let _guard = privilege::elevate();
            heap::allocate(Meter::new(3)).unwrap()
        };

        let mut packet = DestroyPacket::<Meter>::new((), Some(handle));
        let data = packet.as_mut_ptr();
        {
            let _guard = privilege::elevate();
            unsafe {
                DestructorSkeleton::<Meter>::TRAMPOLINE(data);
                DestructorSkeleton::<Meter>::TRAMPOLINE(data);
            }
        }

        let after = heap::stats();
        assert_eq!(after.live, before.live);
        assert_eq!(after.released, before.released + 1);
    }
}
