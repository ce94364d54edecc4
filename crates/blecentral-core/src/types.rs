//! Core data types shared by every component of the scan manager

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name given to devices that advertise no usable name
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown";

// ----------------------------------------------------------------------------
// Adapter State
// ----------------------------------------------------------------------------

/// Power/authorization state of the local Bluetooth adapter
///
/// Values are only ever reported by the platform capability; the manager never
/// derives one locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdapterState {
    PoweredOn,
    PoweredOff,
    Unsupported,
    Unauthorized,
    Resetting,
    #[default]
    Unknown,
}

impl AdapterState {
    /// All states, in declaration order
    pub const ALL: [AdapterState; 6] = [
        AdapterState::PoweredOn,
        AdapterState::PoweredOff,
        AdapterState::Unsupported,
        AdapterState::Unauthorized,
        AdapterState::Resetting,
        AdapterState::Unknown,
    ];

    /// Whether scanning may start in this state
    pub fn is_powered_on(&self) -> bool {
        matches!(self, AdapterState::PoweredOn)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterState::PoweredOn => "poweredOn",
            AdapterState::PoweredOff => "poweredOff",
            AdapterState::Unsupported => "unsupported",
            AdapterState::Unauthorized => "unauthorized",
            AdapterState::Resetting => "resetting",
            AdapterState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ----------------------------------------------------------------------------
// Discovery Types
// ----------------------------------------------------------------------------

/// A single raw advertisement observation from the platform capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    /// Stable identity of the peripheral for this session
    pub id: String,
    /// Advertised name, if any
    pub name: Option<String>,
    /// Signal strength in dBm
    pub rssi: i16,
}

impl DiscoveryReport {
    pub fn new(id: impl Into<String>, name: Option<String>, rssi: i16) -> Self {
        Self {
            id: id.into(),
            name,
            rssi,
        }
    }

    /// Report for a peripheral that advertised a name
    pub fn named(id: impl Into<String>, name: impl Into<String>, rssi: i16) -> Self {
        Self::new(id, Some(name.into()), rssi)
    }

    /// Report for a peripheral without an advertised name
    pub fn anonymous(id: impl Into<String>, rssi: i16) -> Self {
        Self::new(id, None, rssi)
    }
}

/// A discovered peripheral as tracked by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Stable identity string, unique per peripheral for the session
    pub id: String,
    /// Human-readable name, `"Unknown"` when none was advertised
    pub name: String,
    /// Most recent signal strength sample in dBm
    pub rssi: i16,
}

impl Device {
    /// Whether the peripheral advertised no usable name
    pub fn is_unnamed(&self) -> bool {
        self.name == UNKNOWN_DEVICE_NAME
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {} dBm", self.name, self.id, self.rssi)
    }
}

/// Resolve an advertised name to the name stored on a [`Device`]
///
/// Absent, blank, and control-character-only names collapse to
/// [`UNKNOWN_DEVICE_NAME`]; anything else is trimmed.
pub fn resolve_device_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(trimmed) if trimmed.chars().any(|c| !c.is_control()) => trimmed.to_string(),
        _ => UNKNOWN_DEVICE_NAME.to_string(),
    }
}
