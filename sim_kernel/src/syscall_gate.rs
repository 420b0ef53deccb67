//! Kernel gate for the user/kernel isolation boundary.
//!
//! [`KernelGate`] is the simulated kernel's implementation of
//! [`Gate`]. Every stub call goes through it: it elevates the calling
//! context to kernel privilege, runs the trampoline on the packet, restores
//! the previous level and records what happened in a [`GateAuditLog`].
//!
//! A panicking operation is recorded as [`GateEvent::Faulted`] and then
//! resumed with the same payload; the gate never swallows a failure.

use crate::config::GateConfig;
use core_types::CallId;
use kernel_api::{privilege, Gate, PrivilegeLevel, Trampoline};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Gate audit event (for testing and verification).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateEvent {
    /// A trampoline is about to run
    Entered {
        call: CallId,
        caller: PrivilegeLevel,
        depth: u32,
    },
    /// The trampoline returned normally
    Returned { call: CallId, depth: u32 },
    /// The trampoline panicked; the panic is resumed after recording
    Faulted {
        call: CallId,
        depth: u32,
        message: String,
    },
}

impl GateEvent {
    pub fn call(&self) -> CallId {
        match self {
            GateEvent::Entered { call, .. }
            | GateEvent::Returned { call, .. }
            | GateEvent::Faulted { call, .. } => *call,
        }
    }
}

/// Bounded audit log for gate transfers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateAuditLog {
    events: VecDeque<GateEvent>,
    capacity: usize,
    dropped: u64,
}

impl GateAuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Appends an event, dropping the oldest one when full
    pub fn record(&mut self, event: GateEvent) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn events(&self) -> &VecDeque<GateEvent> {
        &self.events
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events discarded because the log was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn has_event<F>(&self, predicate: F) -> bool
    where
        F: Fn(&GateEvent) -> bool,
    {
        self.events.iter().any(predicate)
    }

    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&GateEvent) -> bool,
    {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}

impl Default for GateAuditLog {
    fn default() -> Self {
        Self::new(GateConfig::default().audit_capacity)
    }
}

/// Simulated kernel gate.
///
/// Shareable across threads; privilege is tracked per calling thread, so
/// concurrent transfers from different threads do not observe each other.
pub struct KernelGate {
    config: GateConfig,
    audit_log: Mutex<GateAuditLog>,
    transfers: AtomicU64,
}

impl KernelGate {
    pub fn new() -> Self {
        Self::with_config(GateConfig::default())
    }

    pub fn with_config(config: GateConfig) -> Self {
        Self {
            audit_log: Mutex::new(GateAuditLog::new(config.audit_capacity)),
            config,
            transfers: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Total transfers performed, including faulted ones
    pub fn transfer_count(&self) -> u64 {
        self.transfers.load(Ordering::SeqCst)
    }

    /// Snapshot of the audit log (test-only)
    pub fn audit_log(&self) -> GateAuditLog {
        self.lock_audit_log().clone()
    }

    /// Clears the audit log (test-only)
    pub fn clear_audit_log(&self) {
        self.lock_audit_log().clear();
    }

    fn record(&self, event: GateEvent) {
        if self.config.audit_enabled {
            self.lock_audit_log().record(event);
        }
    }

    // A poisoned log still holds valid events; a fault elsewhere must not
    // stop later transfers from being recorded.
    fn lock_audit_log(&self) -> std::sync::MutexGuard<'_, GateAuditLog> {
        self.audit_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for KernelGate {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Gate for KernelGate {
    fn transfer(&self, trampoline: Trampoline, packet: *mut ()) {
        self.transfers.fetch_add(1, Ordering::SeqCst);

        let call = CallId::new();
        let caller = privilege::current();
        let guard = privilege::elevate();
        let depth = privilege::depth();
        self.record(GateEvent::Entered {
            call,
            caller,
            depth,
        });

        // SAFETY: the trampoline and packet come from the same stub.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| unsafe { trampoline(packet) }));
        drop(guard);

        match outcome {
            Ok(()) => self.record(GateEvent::Returned { call, depth }),
            Err(payload) => {
                self.record(GateEvent::Faulted {
                    call,
                    depth,
                    message: panic_message(&*payload),
                });
                panic::resume_unwind(payload);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
