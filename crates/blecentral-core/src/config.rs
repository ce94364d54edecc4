//! Scan manager configuration

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Manager Configuration
// ----------------------------------------------------------------------------

/// Configuration for a [`CentralScanManager`](crate::CentralScanManager)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Number of state machine audit entries kept for diagnostics
    pub audit_history_len: usize,
    /// Publish `DeviceFound` for repeat sightings, not only the first one
    pub emit_device_updates: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            audit_history_len: 32,
            emit_device_updates: true,
        }
    }
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set audit history length (0 disables the history)
    pub fn with_audit_history_len(mut self, len: usize) -> Self {
        self.audit_history_len = len;
        self
    }

    /// Enable or disable events for repeat sightings
    pub fn with_device_updates(mut self, enabled: bool) -> Self {
        self.emit_device_updates = enabled;
        self
    }

    /// Configuration for tests: keep every audit entry
    pub fn testing() -> Self {
        Self {
            audit_history_len: 1024,
            emit_device_updates: true,
        }
    }
}
