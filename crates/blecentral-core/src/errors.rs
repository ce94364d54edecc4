//! Error types for the scan manager
//!
//! Scan errors are synchronous rejections of a start request. Failures inside the
//! platform capability are never surfaced here; they arrive as adapter states or
//! scan-failure notifications and flow through the event path instead.

use crate::types::AdapterState;
use thiserror::Error;

// ----------------------------------------------------------------------------
// Scan Errors
// ----------------------------------------------------------------------------

/// Reasons a scan could not be started
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Bluetooth adapter is not ready (state: {current_state})")]
    AdapterNotReady { current_state: AdapterState },

    #[error("Already scanning")]
    AlreadyScanning,

    #[error("Scan manager has been shut down")]
    ManagerClosed,
}

/// Result type for scan operations
pub type ScanResult<T> = std::result::Result<T, ScanError>;

// ----------------------------------------------------------------------------
// Channel Errors
// ----------------------------------------------------------------------------

/// Failures delivering a message into the manager's inbox
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Channel is closed")]
    ChannelClosed,

    #[error("Channel receiver was dropped")]
    ReceiverDropped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_not_ready_message_names_state() {
        let err = ScanError::AdapterNotReady {
            current_state: AdapterState::PoweredOff,
        };
        assert_eq!(
            err.to_string(),
            "Bluetooth adapter is not ready (state: poweredOff)"
        );
    }
}
