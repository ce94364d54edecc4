//! Per-session device deduplication
//!
//! Devices are keyed by id. The first sighting fixes a device's position in the
//! listing; later sightings refresh its name and signal strength in place.

use hashbrown::HashMap;

use crate::types::{resolve_device_name, Device, DiscoveryReport};

/// Outcome of merging one discovery report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryUpdate {
    /// First sighting in this session
    Inserted,
    /// Refresh of an existing entry
    Updated,
}

/// Devices discovered since the current session started, in first-sighting order
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRegistry {
    devices: Vec<Device>,
    index: HashMap<String, usize>,
}

impl DiscoveryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a raw report, returning the stored device and whether it was new
    pub fn report_device(&mut self, report: DiscoveryReport) -> (Device, RegistryUpdate) {
        let DiscoveryReport { id, name, rssi } = report;
        let name = resolve_device_name(name.as_deref());

        if let Some(&position) = self.index.get(&id) {
            let device = &mut self.devices[position];
            device.name = name;
            device.rssi = rssi;
            return (device.clone(), RegistryUpdate::Updated);
        }

        let device = Device { id, name, rssi };
        self.index.insert(device.id.clone(), self.devices.len());
        self.devices.push(device.clone());
        (device, RegistryUpdate::Inserted)
    }

    /// Devices in first-discovery order
    pub fn snapshot(&self) -> Vec<Device> {
        self.devices.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Device> {
        self.index.get(id).map(|&position| &self.devices[position])
    }

    pub fn clear(&mut self) {
        self.devices.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
