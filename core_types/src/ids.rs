//! Unique identifiers for kernel objects and gate transfers

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a privileged object
///
/// Assigned by the kernel heap when the object is allocated and carried by
/// its [`Handle`](crate::Handle) so audit entries can be correlated with the
/// stub that owns the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Creates a new random object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an object ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.0)
    }
}

/// Unique identifier for a single gate transfer
///
/// Every trip through the gate gets a fresh ID; the entry and exit audit
/// events of one transfer share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(Uuid);

impl CallId {
    /// Creates a new random call ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Call({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_creation() {
        let id1 = ObjectId::new();
        let id2 = ObjectId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_object_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = ObjectId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn test_call_id_creation() {
        assert_ne!(CallId::new(), CallId::new());
    }

    #[test]
    fn test_id_display() {
        assert!(format!("{}", ObjectId::new()).starts_with("Object("));
        assert!(format!("{}", CallId::new()).starts_with("Call("));
    }

    #[test]
    fn test_object_id_serde_roundtrip() {
        let id = ObjectId::new();
        let json = serde_json::to_string(&id).unwrap();
        let decoded: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, decoded);
    }
}
