//! Handles to privileged objects
//!
//! A [`Handle<T>`] is what user space holds for an object that lives in the
//! kernel heap. It is an address plus an [`ObjectId`], nothing more: user code
//! cannot dereference it. Only privileged code, reached through the gate,
//! turns a handle into a reference.
//!
//! ## Receiver views
//!
//! Instance operations do not carry the handle itself across the gate. They
//! carry a receiver view:
//!
//! - [`Exclusive`]: obtained from `&mut Handle<T>`, dereferences to `&mut T`
//! - [`Shared`]: obtained from `&Handle<T>`, dereferences to `&T` only
//!
//! Holding only `&Handle<T>` therefore makes it impossible to produce a
//! mutating call against the object.
//!
//! A view borrows the handle it came from, so the handle cannot be released
//! while a view is still around:
//!
//! ```compile_fail
//! use core_types::{Handle, ObjectId};
//! use std::ptr::NonNull;
//!
//! let ptr = NonNull::from(Box::leak(Box::new(7u32)));
//! let mut handle = unsafe { Handle::from_raw(ptr, ObjectId::new()) };
//! let view = handle.exclusive();
//! let raw = handle.into_raw();
//! unsafe { drop(Box::from_raw(raw.as_ptr())) };
//! unsafe { *view.get_mut() += 1 };
//! ```

use crate::ObjectId;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Opaque reference to a privileged object of type `T`
///
/// Handles are move-only: one handle names one live object, and releasing the
/// object consumes the handle.
pub struct Handle<T> {
    ptr: NonNull<T>,
    id: ObjectId,
}

impl<T> Handle<T> {
    /// Wraps a raw object address
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live, initialized `T` owned by the kernel heap,
    /// and no other handle to the same object may exist.
    pub unsafe fn from_raw(ptr: NonNull<T>, id: ObjectId) -> Self {
        Self { ptr, id }
    }

    /// Consumes the handle, returning the raw object address
    pub fn into_raw(self) -> NonNull<T> {
        self.ptr
    }

    /// Returns the object's identifier
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the object's address (for diagnostics)
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Produces a mutating receiver view
    pub fn exclusive(&mut self) -> Exclusive<'_, T> {
        Exclusive {
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }

    /// Produces a read-only receiver view
    pub fn shared(&self) -> Shared<'_, T> {
        Shared {
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("type", &std::any::type_name::<T>())
            .field("id", &self.id)
            .finish()
    }
}

/// Receiver view for a mutating instance operation
///
/// Mutably borrows the handle for `'a`.
pub struct Exclusive<'a, T> {
    ptr: NonNull<T>,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Exclusive<'a, T> {
    /// Dereferences the receiver
    ///
    /// # Safety
    ///
    /// Must only be called with kernel privilege, while the object is live,
    /// and the returned reference must not outlive the current gate transfer.
    pub unsafe fn get_mut(&self) -> &'a mut T {
        &mut *self.ptr.as_ptr()
    }
}

/// Receiver view for a read-only instance operation
pub struct Shared<'a, T> {
    ptr: NonNull<T>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Shared<'a, T> {
    /// Dereferences the receiver
    ///
    /// # Safety
    ///
    /// Same as [`Exclusive::get_mut`].
    pub unsafe fn get(&self) -> &'a T {
        &*self.ptr.as_ptr()
    }
}
