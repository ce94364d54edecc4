//! btleplug capability configuration

use uuid::Uuid;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for [`BtleplugCapability`](crate::BtleplugCapability)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BtleCapabilityConfig {
    /// Which host adapter to use, in the order btleplug lists them
    pub adapter_index: usize,
    /// Only report peripherals advertising one of these services (empty = all)
    pub service_filter: Vec<Uuid>,
}

impl Default for BtleCapabilityConfig {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            service_filter: Vec::new(),
        }
    }
}

impl BtleCapabilityConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the adapter index
    pub fn with_adapter_index(mut self, index: usize) -> Self {
        self.adapter_index = index;
        self
    }

    /// Replace the service filter
    pub fn with_service_filter(mut self, services: Vec<Uuid>) -> Self {
        self.service_filter = services;
        self
    }

    /// Add one service to the filter
    pub fn with_service(mut self, service: Uuid) -> Self {
        self.service_filter.push(service);
        self
    }
}
