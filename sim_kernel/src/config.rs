//! Kernel configuration
//!
//! The simulated kernel is configured from JSON. Every field has a default,
//! so an empty object (`{}`) is a valid configuration.
//!
//! ```json
//! {
//!   "gate": { "audit_enabled": true, "audit_capacity": 1024 },
//!   "heap": { "max_live_objects": 64, "audit_capacity": 1024 }
//! }
//! ```

use resources::audit::DEFAULT_AUDIT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Gate audit settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Record gate events
    pub audit_enabled: bool,
    /// Maximum retained gate events; the oldest are dropped first
    pub audit_capacity: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            audit_enabled: true,
            audit_capacity: 1024,
        }
    }
}

/// Kernel heap settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Cap on live objects per execution context (`None` = unlimited)
    pub max_live_objects: Option<u64>,
    /// Maximum retained heap events per execution context
    pub audit_capacity: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            max_live_objects: None,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }
}

/// Complete simulated kernel configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub gate: GateConfig,
    pub heap: HeapConfig,
}

impl KernelConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gate.audit_enabled && self.gate.audit_capacity == 0 {
            return Err(ConfigError::Invalid(
                "gate.audit_capacity must be non-zero when auditing is enabled".to_string(),
            ));
        }
        if self.heap.max_live_objects == Some(0) {
            return Err(ConfigError::Invalid(
                "heap.max_live_objects must be non-zero (omit it for no limit)".to_string(),
            ));
        }
        if self.heap.audit_capacity == 0 {
            return Err(ConfigError::Invalid("heap.audit_capacity must be non-zero".to_string()));
        }
        Ok(())
    }
}
