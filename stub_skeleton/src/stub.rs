//! Stub generation: client-side proxies with ordinary call syntax.
//!
//! [`Proxy`] is the runtime every generated stub wraps. It owns exactly one
//! handle, issues construction before it exists and destruction when it is
//! dropped, and hands out receiver views with the right mutability.
//!
//! [`stub!`](crate::stub) declares a stub type for a privileged type;
//! [`function_stub!`](crate::function_stub) declares stubs for free functions.
//! Every generated operation defines a local binding type naming exactly one
//! operation, so its trampoline is fixed when the crate is built.
//!
//! ```
//! use stub_skeleton::{function_stub, stub};
//!
//! pub struct Counter {
//!     value: i64,
//! }
//!
//! impl Counter {
//!     pub fn new() -> Self {
//!         Self { value: 0 }
//!     }
//!
//!     pub fn increment(&mut self, by: i64) {
//!         self.value += by;
//!     }
//!
//!     pub fn value(&self) -> i64 {
//!         self.value
//!     }
//! }
//!
//! pub fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! stub! {
//!     /// User-side proxy for [`Counter`].
//!     pub struct CounterStub for Counter;
//!
//!     construct fn new();
//!     fn increment(&mut self, by: i64);
//!     fn value(&self) -> i64;
//! }
//!
//! function_stub! {
//!     pub fn add_stub(a: i32, b: i32) -> i32 = add;
//! }
//! ```

use crate::skeleton::{Construct, ConstructSkeleton, DestructorSkeleton};
use core_types::{Exclusive, Handle, ObjectId, Shared};
use kernel_api::{Gate, KernelError};
use std::mem::ManuallyDrop;

/// Runtime half of a generated stub
///
/// Holds one handle to a privileged object and the gate used to reach it.
/// The object is destroyed, through the gate, exactly once: when the proxy
/// is dropped.
///
/// Receiver views borrow the proxy, so no call can reach the object after
/// the proxy has destroyed it:
///
/// ```compile_fail
/// use stub_skeleton::{Construct, Gate, Method, Proxy, Skeleton, Trampoline};
///
/// struct Loopback;
///
/// unsafe impl Gate for Loopback {
///     fn transfer(&self, trampoline: Trampoline, packet: *mut ()) {
///         unsafe { trampoline(packet) }
///     }
/// }
///
/// struct Tape(Vec<u8>);
///
/// struct NewTape;
///
/// impl Construct for NewTape {
///     type Object = Tape;
///     type Args = ();
///
///     fn construct(_: ()) -> Tape {
///         Tape(Vec::new())
///     }
/// }
///
/// struct Length;
///
/// impl Method for Length {
///     type Object = Tape;
///     type Args = ();
///     type Output = usize;
///
///     fn call(tape: &mut Tape, _: ()) -> usize {
///         tape.0.len()
///     }
/// }
///
/// let gate = Loopback;
/// let mut proxy: Proxy<'_, Tape, Loopback> = Proxy::construct::<NewTape>(&gate, ()).unwrap();
/// let stale = proxy.exclusive();
/// drop(proxy);
/// Skeleton::<Length>::invoke(&gate, stale, ());
/// ```
pub struct Proxy<'g, T, G: Gate + ?Sized> {
    object: ManuallyDrop<Handle<T>>,
    gate: &'g G,
}

impl<'g, T, G: Gate + ?Sized> Proxy<'g, T, G> {
    /// Issues the construction operation and takes ownership of the result
    pub fn construct<C>(gate: &'g G, args: C::Args) -> Result<Self, KernelError>
    where
        C: Construct<Object = T>,
    {
        let handle = ConstructSkeleton::<C>::invoke(gate, args)?;
        Ok(Self {
            object: ManuallyDrop::new(handle),
            gate,
        })
    }

    /// Gate this proxy transfers through
    pub fn gate(&self) -> &'g G {
        self.gate
    }

    /// Receiver view for a mutating operation
    pub fn exclusive(&mut self) -> Exclusive<'_, T> {
        self.object.exclusive()
    }

    /// Receiver view for a read-only operation
    pub fn shared(&self) -> Shared<'_, T> {
        self.object.shared()
    }

    /// Identifier of the privileged object
    pub fn object_id(&self) -> ObjectId {
        self.object.id()
    }
}

impl<'g, T, G: Gate + ?Sized> Drop for Proxy<'g, T, G> {
    fn drop(&mut self) {
        // SAFETY: `object` is never touched again after this point.
        let handle = unsafe { ManuallyDrop::take(&mut self.object) };
        DestructorSkeleton::<T>::invoke(self.gate, handle);
    }
}

/// Declares a stub type for a privileged type.
///
/// ```text
/// stub! {
///     pub struct CounterStub for Counter;
///
///     construct fn new();                       // Counter::new()
///     construct fn with_start(start: i64);      // Counter::with_start(start)
///     fn increment(&mut self, by: i64);         // mutating, void
///     fn add(&mut self, by: i64) -> i64;        // mutating, non-void
///     fn value(&self) -> i64;                   // read-only, non-void
///     fn audit(&self);                          // read-only, void
/// }
/// ```
///
/// Each `construct fn` becomes an associated function taking the gate first
/// and returning `Result<Self, KernelError>`. Each `fn` forwards to the
/// method of the same name on the privileged type. Argument types must be
/// owned values.
#[macro_export]
macro_rules! stub {
    (
        $(#[$meta:meta])*
        $vis:vis struct $stub:ident for $object:ty;
        $($items:tt)*
    ) => {
        $(#[$meta])*
        $vis struct $stub<'g, G: $crate::Gate + ?Sized> {
            proxy: $crate::Proxy<'g, $object, G>,
        }

        impl<'g, G: $crate::Gate + ?Sized> $stub<'g, G> {
            /// Identifier of the privileged object behind this stub
            pub fn object_id(&self) -> $crate::ObjectId {
                self.proxy.object_id()
            }

            $crate::__stub_items! { ['g, G] $object; $($items)* }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __stub_items {
    ([$lt:lifetime, $g:ident] $object:ty;) => {};

    (
        [$lt:lifetime, $g:ident] $object:ty;
        $(#[$meta:meta])*
        construct fn $name:ident($($arg:ident : $ty:ty),*);
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        pub fn $name(
            gate: &$lt $g $(, $arg: $ty)*
        ) -> ::core::result::Result<Self, $crate::KernelError> {
            struct Binding;
            impl $crate::Construct for Binding {
                type Object = $object;
                type Args = ($($ty,)*);
                fn construct(args: Self::Args) -> $object {
                    $crate::tuple::Apply::apply(args, <$object>::$name)
                }
            }
            let proxy = $crate::Proxy::construct::<Binding>(gate, ($($arg,)*))?;
            ::core::result::Result::Ok(Self { proxy })
        }
        $crate::__stub_items! { [$lt, $g] $object; $($rest)* }
    };

    (
        [$lt:lifetime, $g:ident] $object:ty;
        $(#[$meta:meta])*
        fn $name:ident(&mut self $(, $arg:ident : $ty:ty)*) -> $ret:ty;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        pub fn $name(&mut self $(, $arg: $ty)*) -> $ret {
            struct Binding;
            impl $crate::Method for Binding {
                type Object = $object;
                type Args = ($($ty,)*);
                type Output = $ret;
                fn call(object: &mut $object, args: Self::Args) -> $ret {
                    $crate::tuple::ApplyTo::apply_to(args, object, <$object>::$name)
                }
            }
            let gate = self.proxy.gate();
            $crate::Skeleton::<Binding>::invoke(gate, self.proxy.exclusive(), ($($arg,)*))
        }
        $crate::__stub_items! { [$lt, $g] $object; $($rest)* }
    };

    (
        [$lt:lifetime, $g:ident] $object:ty;
        $(#[$meta:meta])*
        fn $name:ident(&mut self $(, $arg:ident : $ty:ty)*);
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        pub fn $name(&mut self $(, $arg: $ty)*) {
            struct Binding;
            impl $crate::Method for Binding {
                type Object = $object;
                type Args = ($($ty,)*);
                type Output = ();
                fn call(object: &mut $object, args: Self::Args) {
                    $crate::tuple::ApplyTo::apply_to(args, object, <$object>::$name)
                }
            }
            let gate = self.proxy.gate();
            $crate::VoidSkeleton::<Binding>::invoke(gate, self.proxy.exclusive(), ($($arg,)*))
        }
        $crate::__stub_items! { [$lt, $g] $object; $($rest)* }
    };

    (
        [$lt:lifetime, $g:ident] $object:ty;
        $(#[$meta:meta])*
        fn $name:ident(&self $(, $arg:ident : $ty:ty)*) -> $ret:ty;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        pub fn $name(&self $(, $arg: $ty)*) -> $ret {
            struct Binding;
            impl $crate::ConstMethod for Binding {
                type Object = $object;
                type Args = ($($ty,)*);
                type Output = $ret;
                fn call(object: &$object, args: Self::Args) -> $ret {
                    $crate::tuple::ApplyTo::apply_to(args, object, <$object>::$name)
                }
            }
            $crate::ConstSkeleton::<Binding>::invoke(
                self.proxy.gate(),
                self.proxy.shared(),
                ($($arg,)*),
            )
        }
        $crate::__stub_items! { [$lt, $g] $object; $($rest)* }
    };

    (
        [$lt:lifetime, $g:ident] $object:ty;
        $(#[$meta:meta])*
        fn $name:ident(&self $(, $arg:ident : $ty:ty)*);
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        pub fn $name(&self $(, $arg: $ty)*) {
            struct Binding;
            impl $crate::ConstMethod for Binding {
                type Object = $object;
                type Args = ($($ty,)*);
                type Output = ();
                fn call(object: &$object, args: Self::Args) {
                    $crate::tuple::ApplyTo::apply_to(args, object, <$object>::$name)
                }
            }
            $crate::ConstVoidSkeleton::<Binding>::invoke(
                self.proxy.gate(),
                self.proxy.shared(),
                ($($arg,)*),
            )
        }
        $crate::__stub_items! { [$lt, $g] $object; $($rest)* }
    };
}

/// Declares stubs for free functions.
///
/// ```text
/// function_stub! {
///     pub fn add(a: i32, b: i32) -> i32 = arith::add;   // non-void
///     pub fn tick() = clock::tick;                      // void
/// }
/// ```
///
/// Each stub takes the gate as its first parameter.
#[macro_export]
macro_rules! function_stub {
    () => {};

    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident($($arg:ident : $ty:ty),*) -> $ret:ty = $target:path;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis fn $name<G: $crate::Gate + ?Sized>(gate: &G $(, $arg: $ty)*) -> $ret {
            struct Binding;
            impl $crate::Function for Binding {
                type Args = ($($ty,)*);
                type Output = $ret;
                fn call(args: Self::Args) -> $ret {
                    $crate::tuple::Apply::apply(args, $target)
                }
            }
            $crate::FunctionSkeleton::<Binding>::invoke(gate, ($($arg,)*))
        }
        $crate::function_stub! { $($rest)* }
    };

    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident($($arg:ident : $ty:ty),*) = $target:path;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis fn $name<G: $crate::Gate + ?Sized>(gate: &G $(, $arg: $ty)*) {
            struct Binding;
            impl $crate::Function for Binding {
                type Args = ($($ty,)*);
                type Output = ();
                fn call(args: Self::Args) {
                    $crate::tuple::Apply::apply(args, $target)
                }
            }
            $crate::VoidFunctionSkeleton::<Binding>::invoke(gate, ($($arg,)*))
        }
        $crate::function_stub! { $($rest)* }
    };
}

#[cfg(test)]
mod tests {
    use crate::skeleton::{ConstMethod, ConstSkeleton, Construct, Method, Skeleton};
    use crate::stub::Proxy;
    use kernel_api::{privilege, Gate, KernelError, Trampoline};
    use resources::heap;
    use std::cell::Cell;

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

    pub struct Lamp {
        lit: bool,
        brightness: u8,
        looks: Cell<u32>,
    }

    impl Lamp {
        pub fn new() -> Self {
            Self::with_brightness(0)
        }

        pub fn with_brightness(brightness: u8) -> Self {
            Self {
                lit: brightness > 0,
                brightness,
                looks: Cell::new(0),
            }
        }

        pub fn toggle(&mut self) {
            self.lit = !self.lit;
        }

        pub fn dim(&mut self, by: u8) -> u8 {
            self.brightness = self.brightness.saturating_sub(by);
            self.brightness
        }

        pub fn is_lit(&self) -> bool {
            self.lit
        }

        pub fn look(&self) {
            self.looks.set(self.looks.get() + 1);
        }

        pub fn looks(&self) -> u32 {
            self.looks.get()
        }
    }

    fn double(value: u32) -> u32 {
        value * 2
    }

    fn ignore(_value: u32) {}

    crate::stub! {
        /// Proxy for [`Lamp`].
        struct LampStub for Lamp;

        construct fn new();
        construct fn with_brightness(brightness: u8);
        fn toggle(&mut self);
        fn dim(&mut self, by: u8) -> u8;
        fn is_lit(&self) -> bool;
        fn look(&self);
        fn looks(&self) -> u32;
    }

    crate::function_stub! {
        fn double_stub(value: u32) -> u32 = double;
        fn ignore_stub(value: u32) = ignore;
    }

    #[test]
    fn test_generated_stub_round_trip() {
        let gate = LoopbackGate::new();
        let before = heap::stats();

        {
            let mut lamp = LampStub::new(&gate).unwrap();
            assert!(!lamp.is_lit());
            lamp.toggle();
            assert!(lamp.is_lit());
            lamp.look();
            lamp.look();
            assert_eq!(lamp.looks(), 2);
            assert_eq!(heap::stats().live, before.live + 1);
        }

        assert_eq!(heap::stats().live, before.live);
        // construct + 6 operations + destroy
        assert_eq!(gate.transfers.get(), 8);
    }

    struct WithBrightness;

    impl Construct for WithBrightness {
        type Object = Lamp;
        type Args = (u8,);

        fn construct((brightness,): (u8,)) -> Lamp {
            Lamp::with_brightness(brightness)
        }
    }

    struct Dim;

    impl Method for Dim {
        type Object = Lamp;
        type Args = (u8,);
        type Output = u8;

        fn call(lamp: &mut Lamp, (by,): (u8,)) -> u8 {
            lamp.dim(by)
        }
    }

    struct IsLit;

    impl ConstMethod for IsLit {
        type Object = Lamp;
        type Args = ();
        type Output = bool;

        fn call(lamp: &Lamp, _: ()) -> bool {
            lamp.is_lit()
        }
    }

    #[test]
    fn test_proxy_views_reach_live_object() {
        let gate = LoopbackGate::new();
        let before = heap::stats();
        let mut proxy: Proxy<'_, Lamp, LoopbackGate> =
            Proxy::construct::<WithBrightness>(&gate, (5,)).unwrap();

        let view = proxy.exclusive();
        assert_eq!(Skeleton::<Dim>::invoke(&gate, view, (2,)), 3);
        assert!(ConstSkeleton::<IsLit>::invoke(&gate, proxy.shared(), ()));

        drop(proxy);
        assert_eq!(heap::stats().live, before.live);
        assert_eq!(gate.transfers.get(), 4);
    }

    #[test]
    fn test_constructor_with_arguments() {
        let gate = LoopbackGate::new();
        let mut lamp = LampStub::with_brightness(&gate, 10).unwrap();
        assert!(lamp.is_lit());
        assert_eq!(lamp.dim(3), 7);
        assert_eq!(lamp.dim(20), 0);
    }

    #[test]
    fn test_constructor_failure_skips_destruction() {
        let gate = LoopbackGate::new();
        heap::set_quota(Some(0));

        let result = LampStub::new(&gate);
        assert!(matches!(result, Err(KernelError::HeapExhausted { .. })));
        assert_eq!(gate.transfers.get(), 1);

        heap::set_quota(None);
    }

    #[test]
    fn test_function_stubs() {
        let gate = LoopbackGate::new();
        assert_eq!(double_stub(&gate, 21), 42);
        ignore_stub(&gate, 5);
        assert_eq!(gate.transfers.get(), 2);
    }

    #[test]
    fn test_object_ids_are_distinct() {
        let gate = LoopbackGate::new();
        let a = LampStub::new(&gate).unwrap();
        let b = LampStub::new(&gate).unwrap();
        assert_ne!(a.object_id(), b.object_id());
    }
}
