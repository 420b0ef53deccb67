//! Kernel heap audit log
//!
//! Records every allocation, release and refused allocation on an execution
//! context. Entries are numbered in the order they happened so tests can
//! assert on sequences, and they serialize for export.
//!
//! The log is bounded: once full, the oldest entry is discarded for each new
//! one and counted in [`HeapAuditLog::dropped`].
//!
//! This is for verification, not production observability.

use core_types::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Entries retained when no capacity is configured
pub const DEFAULT_AUDIT_CAPACITY: usize = 1024;

/// Kernel heap event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeapEvent {
    /// A privileged object was allocated
    Allocated {
        object: ObjectId,
        type_name: String,
        live: u64,
    },
    /// A privileged object was released
    Released {
        object: ObjectId,
        type_name: String,
        live: u64,
    },
    /// An allocation was refused
    Denied { type_name: String, reason: String },
}

impl HeapEvent {
    /// Object the event refers to, if any
    pub fn object(&self) -> Option<ObjectId> {
        match self {
            HeapEvent::Allocated { object, .. } | HeapEvent::Released { object, .. } => {
                Some(*object)
            }
            HeapEvent::Denied { .. } => None,
        }
    }
}

/// Audit entry with its position in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapAuditEntry {
    pub sequence: u64,
    pub event: HeapEvent,
}

/// Bounded heap audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeapAuditLog {
    entries: VecDeque<HeapAuditEntry>,
    capacity: usize,
    dropped: u64,
    next_sequence: u64,
}

impl HeapAuditLog {
    /// Creates an empty log retaining at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            dropped: 0,
            next_sequence: 0,
        }
    }

    /// Records a heap event, dropping the oldest entry when full
    pub fn record(&mut self, event: HeapEvent) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.entries.push_back(HeapAuditEntry { sequence, event });
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity, discarding the oldest entries that no longer fit
    pub fn set_capacity(&mut self, capacity: usize) {
        while self.entries.len() > capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.capacity = capacity;
    }

    /// Number of entries discarded because the log was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all entries
    pub fn entries(&self) -> &VecDeque<HeapAuditEntry> {
        &self.entries
    }

    /// Clears all entries (sequence numbers keep increasing)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Checks if any entry matches a predicate
    pub fn has_event<F>(&self, predicate: F) -> bool
    where
        F: Fn(&HeapEvent) -> bool,
    {
        self.entries.iter().any(|entry| predicate(&entry.event))
    }

    /// Counts events matching a predicate
    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&HeapEvent) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| predicate(&entry.event))
            .count()
    }

    /// Returns the events that refer to one object, in order
    pub fn events_for_object(&self, object: ObjectId) -> Vec<&HeapEvent> {
        self.entries
            .iter()
            .map(|entry| &entry.event)
            .filter(|event| event.object() == Some(object))
            .collect()
    }
}

impl Default for HeapAuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}
