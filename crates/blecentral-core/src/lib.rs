//! BLE central scan manager
//!
//! Tracks the host Bluetooth adapter's state, runs scan sessions, deduplicates
//! discovered peripherals by identifier, and publishes changes to subscribers.
//!
//! ## Architecture
//!
//! - [`types`] - Adapter states, discovery reports and devices
//! - [`adapter_state`] - Change-only mirror of the adapter state
//! - [`registry`] - Per-session device deduplication
//! - [`session`] - Idle/Scanning state machine with effects and audit entries
//! - [`event_bus`] - Topic-based synchronous publish/subscribe
//! - [`capability`] - The interface the manager needs from the platform
//! - [`channel`] - Inbox protocol between handles, capability and manager task
//! - [`scan_core`] - Single-owner composition of all of the above
//! - [`manager`] - Task and cloneable handle
//!
//! ## Usage
//!
//! ```rust,no_run
//! use blecentral_core::{CentralScanManager, ManagerConfig, SimulatedCapability};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = CentralScanManager::spawn(SimulatedCapability::new(), ManagerConfig::default());
//!
//! manager.on_device_found(|device| println!("{}", device));
//! manager.start().await?;
//!
//! // ... later
//! manager.stop().await;
//! let devices = manager.current_devices().await;
//! manager.shutdown().await;
//! # let _ = devices;
//! # Ok(())
//! # }
//! ```

pub mod adapter_state;
pub mod capability;
pub mod channel;
pub mod config;
pub mod errors;
pub mod event_bus;
pub mod manager;
pub mod registry;
pub mod scan_core;
pub mod session;
pub mod simulated;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use adapter_state::AdapterStateTracker;
pub use capability::PlatformCapability;
pub use channel::{CapabilityEvent, CapabilitySender};
pub use config::ManagerConfig;
pub use errors::{ChannelError, ScanError, ScanResult};
pub use event_bus::{EventBus, InterruptCause, ScanEvent, SubscriptionHandle, Topic};
pub use manager::CentralScanManager;
pub use registry::{DiscoveryRegistry, RegistryUpdate};
pub use scan_core::ScanCore;
pub use session::{AuditEntry, ScanSessionController, ScanState, SessionEnd, SessionSummary};
pub use simulated::{CapabilityCall, SimulatedCapability};
pub use types::{resolve_device_name, AdapterState, Device, DiscoveryReport, UNKNOWN_DEVICE_NAME};
