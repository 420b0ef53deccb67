//! Kernel heap: the privileged allocator
//!
//! Privileged objects live here. User space never allocates or frees them
//! directly; construction and destruction trampolines do it on its behalf,
//! while the gate holds the context at kernel privilege.
//!
//! The ledger, quota and audit log are kept per execution context. A gate
//! transfer runs on the caller's context, so everything a caller constructs
//! is accounted to that caller and independent contexts never observe each
//! other's counts.

use crate::audit::{HeapAuditLog, HeapEvent};
use core_types::{Handle, ObjectId};
use kernel_api::{privilege, KernelError};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::ptr::NonNull;

/// Allocation ledger of one execution context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeapStats {
    /// Objects currently live
    pub live: u64,
    /// Objects allocated since the context started
    pub allocated: u64,
    /// Objects released since the context started
    pub released: u64,
}

struct KernelHeap {
    stats: HeapStats,
    quota: Option<u64>,
    audit: HeapAuditLog,
}

impl KernelHeap {
    fn new() -> Self {
        Self {
            stats: HeapStats::default(),
            quota: None,
            audit: HeapAuditLog::default(),
        }
    }
}

thread_local! {
    static HEAP: RefCell<KernelHeap> = RefCell::new(KernelHeap::new());
}

/// Allocates a privileged object, running `init` to produce it.
///
/// Requires kernel privilege. The quota is checked before `init` runs, so a
/// refused allocation never constructs the object.
pub fn allocate_with<T, F>(init: F) -> Result<Handle<T>, KernelError>
where
    F: FnOnce() -> T,
{
    let type_name = std::any::type_name::<T>();

    if !privilege::is_kernel() {
        record(HeapEvent::Denied {
            type_name: type_name.to_string(),
            reason: "caller lacks kernel privilege".to_string(),
        });
        return Err(KernelError::Unprivileged(format!("allocate {}", type_name)));
    }

    let (quota, live) = HEAP.with(|heap| {
        let heap = heap.borrow();
        (heap.quota, heap.stats.live)
    });
    if let Some(limit) = quota {
        if live >= limit {
            record(HeapEvent::Denied {
                type_name: type_name.to_string(),
                reason: format!("quota of {} objects reached", limit),
            });
            return Err(KernelError::HeapExhausted { limit, live });
        }
    }

    // Initialization may itself reach the heap, so it runs unborrowed.
    let ptr = NonNull::from(Box::leak(Box::new(init())));
    let id = ObjectId::new();

    HEAP.with(|heap| {
        let mut heap = heap.borrow_mut();
        heap.stats.live += 1;
        heap.stats.allocated += 1;
        let live = heap.stats.live;
        heap.audit.record(HeapEvent::Allocated {
            object: id,
            type_name: type_name.to_string(),
            live,
        });
    });

    // SAFETY: `ptr` comes from a fresh Box and no other handle exists.
    Ok(unsafe { Handle::from_raw(ptr, id) })
}

/// Allocates a privileged object from an already constructed value
pub fn allocate<T>(value: T) -> Result<Handle<T>, KernelError> {
    allocate_with(|| value)
}

/// Releases a privileged object, running its destructor.
///
/// # Safety
///
/// `handle` must have been produced by [`allocate_with`] on this execution
/// context and the object must not be referenced after this call.
pub unsafe fn release<T>(handle: Handle<T>) {
    debug_assert!(
        privilege::is_kernel(),
        "kernel heap released outside the gate"
    );
    let id = handle.id();
    let ptr = handle.into_raw();

    // Dropped unborrowed: the destructor may release objects it owns.
    drop(Box::from_raw(ptr.as_ptr()));

    HEAP.with(|heap| {
        let mut heap = heap.borrow_mut();
        heap.stats.live = heap.stats.live.saturating_sub(1);
        heap.stats.released += 1;
        let live = heap.stats.live;
        heap.audit.record(HeapEvent::Released {
            object: id,
            type_name: std::any::type_name::<T>().to_string(),
            live,
        });
    });
}

/// Returns the calling context's ledger
pub fn stats() -> HeapStats {
    HEAP.with(|heap| heap.borrow().stats)
}

/// Sets the live-object quota for the calling context (`None` = unlimited)
pub fn set_quota(limit: Option<u64>) {
    HEAP.with(|heap| heap.borrow_mut().quota = limit);
}

/// Returns the live-object quota for the calling context
pub fn quota() -> Option<u64> {
    HEAP.with(|heap| heap.borrow().quota)
}

/// Returns a snapshot of the calling context's heap audit log
pub fn audit_log() -> HeapAuditLog {
    HEAP.with(|heap| heap.borrow().audit.clone())
}

/// Sets how many audit entries the calling context retains
pub fn set_audit_capacity(capacity: usize) {
    HEAP.with(|heap| heap.borrow_mut().audit.set_capacity(capacity));
}

/// Returns how many audit entries the calling context retains
pub fn audit_capacity() -> usize {
    HEAP.with(|heap| heap.borrow().audit.capacity())
}

/// Clears the calling context's heap audit log (test-only)
pub fn clear_audit_log() {
    HEAP.with(|heap| heap.borrow_mut().audit.clear());
}

fn record(event: HeapEvent) {
    HEAP.with(|heap| heap.borrow_mut().audit.record(event));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node {
        child: Option<Handle<u32>>,
    }

    impl Drop for Node {
        fn drop(&mut self) {
            if let Some(child) = self.child.take() {
                unsafe { release(child) };
            }
        }
    }

    #[test]
    fn test_allocate_requires_privilege() {
        let before = stats();
        let result = allocate(5u32);
        assert!(matches!(result, Err(KernelError::Unprivileged(_))));
        assert_eq!(stats(), before);
        assert!(audit_log().has_event(|e| matches!(e, HeapEvent::Denied { .. })));
    }

    #[test]
    fn test_allocate_and_release_balance() {
        let _guard = privilege::elevate();
        let before = stats();

        let handle = allocate(String::from("kernel object")).unwrap();
        assert_eq!(stats().live, before.live + 1);

        unsafe { release(handle) };
        let after = stats();
        assert_eq!(after.live, before.live);
        assert_eq!(after.allocated, before.allocated + 1);
        assert_eq!(after.released, before.released + 1);
    }

    #[test]
    fn test_quota_refuses_before_init() {
        let _guard = privilege::elevate();
        set_quota(Some(1));

        let first = allocate(1u8).unwrap();
        let mut ran = false;
        let second = allocate_with(|| {
            ran = true;
            2u8
        });

        assert_eq!(second.unwrap_err(), KernelError::HeapExhausted { limit: 1, live: 1 });
        assert!(!ran);

        unsafe { release(first) };
        set_quota(None);
    }

    #[test]
    fn test_nested_release_from_destructor() {
        let _guard = privilege::elevate();
        clear_audit_log();
        let before = stats();
        let child = allocate(9u32).unwrap();
        let node = allocate(Node { child: Some(child) }).unwrap();
        assert_eq!(stats().live, before.live + 2);

        unsafe { release(node) };
        assert_eq!(stats().live, before.live);
        assert_eq!(
            audit_log().count_events(|e| matches!(e, HeapEvent::Released { .. })),
            2
        );
    }

    #[test]
    fn test_audit_log_stays_bounded_under_churn() {
        let _guard = privilege::elevate();
        let previous = audit_capacity();
        set_audit_capacity(8);
        let dropped_before = audit_log().dropped();

        for value in 0..100u32 {
            let handle = allocate(value).unwrap();
            unsafe { release(handle) };
        }

        let log = audit_log();
        assert_eq!(log.len(), 8);
        assert_eq!(log.dropped(), dropped_before + 192);
        assert!(matches!(
            log.entries().back().map(|entry| &entry.event),
            Some(HeapEvent::Released { .. })
        ));

        set_audit_capacity(previous);
    }

    #[test]
    fn test_ledger_is_per_context() {
        let _guard = privilege::elevate();
        let handle = allocate(3u64).unwrap();

        let other = std::thread::spawn(stats).join().unwrap();
        assert_eq!(other.live, 0);

        unsafe { release(handle) };
    }
}
