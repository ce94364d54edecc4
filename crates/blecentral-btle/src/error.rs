//! Error types for the btleplug capability
//!
//! These cover adapter setup only. Once a capability is attached, failures are
//! reported to the scan manager as adapter states or scan failures.

use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum BtleCapabilityError {
    #[error("Failed to create BLE manager: {0}")]
    ManagerUnavailable(String),

    #[error("Failed to get BLE adapters: {0}")]
    AdapterQueryFailed(String),

    #[error("No BLE adapters available")]
    NoAdapters,

    #[error("Adapter index {index} out of range ({available} available)")]
    AdapterIndexOutOfRange { index: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, BtleCapabilityError>;
