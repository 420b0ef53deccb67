//! Tuple application.
//!
//! Arguments cross the gate packed in an ordinary tuple. These traits unpack
//! a tuple into positional arguments, left to right, by value. Each arity is
//! one line in the shape list at the bottom of this file; adding an arity
//! adds one line.

/// Calls `f` with the tuple's elements as positional arguments
pub trait Apply<F> {
    type Output;

    fn apply(self, f: F) -> Self::Output;
}

/// Calls `f` with `receiver` followed by the tuple's elements
///
/// This is how a method path like `Counter::increment` is applied to a
/// receiver and its packed arguments.
pub trait ApplyTo<Rx, F> {
    type Output;

    fn apply_to(self, receiver: Rx, f: F) -> Self::Output;
}

macro_rules! tuple_shape {
    ($($ty:ident $arg:ident),*) => {
        impl<F, R, $($ty,)*> Apply<F> for ($($ty,)*)
        where
            F: FnOnce($($ty),*) -> R,
        {
            type Output = R;

            fn apply(self, f: F) -> R {
                let ($($arg,)*) = self;
                f($($arg),*)
            }
        }

        impl<Rx, F, R, $($ty,)*> ApplyTo<Rx, F> for ($($ty,)*)
        where
            F: FnOnce(Rx, $($ty),*) -> R,
        {
            type Output = R;

            fn apply_to(self, receiver: Rx, f: F) -> R {
                let ($($arg,)*) = self;
                f(receiver, $($arg),*)
            }
        }
    };
}

tuple_shape!();
tuple_shape!(A a);
tuple_shape!(A a, B b);
tuple_shape!(A a, B b, C c);
