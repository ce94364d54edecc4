//! btleplug platform capability for the blecentral scan manager
//!
//! Connects [`blecentral_core::CentralScanManager`] to a real host adapter.
//!
//! - [`config`] - Adapter selection and service filtering
//! - [`error`] - Adapter setup errors
//! - [`convert`] - Mapping btleplug states and properties into core types
//! - [`capability`] - The [`PlatformCapability`](blecentral_core::PlatformCapability) implementation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use blecentral_btle::{BtleCapabilityConfig, BtleplugCapability};
//! use blecentral_core::{CentralScanManager, ManagerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let capability = BtleplugCapability::new(BtleCapabilityConfig::default()).await?;
//! let manager = CentralScanManager::spawn(capability, ManagerConfig::default());
//!
//! manager.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod config;
pub mod convert;
pub mod error;

// Public API exports
pub use capability::BtleplugCapability;
pub use config::BtleCapabilityConfig;
pub use error::{BtleCapabilityError, Result};
