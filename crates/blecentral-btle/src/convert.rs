//! Mapping btleplug values into scan manager types

use blecentral_core::{AdapterState, DiscoveryReport};
use btleplug::api::{CentralState, PeripheralProperties};

/// Map btleplug's adapter state onto the manager's
///
/// btleplug only distinguishes on, off and unknown; the finer states are never
/// produced on this path.
pub fn adapter_state_from_central(state: CentralState) -> AdapterState {
    #[allow(unreachable_patterns)]
    match state {
        CentralState::PoweredOn => AdapterState::PoweredOn,
        CentralState::PoweredOff => AdapterState::PoweredOff,
        CentralState::Unknown => AdapterState::Unknown,
        _ => AdapterState::Unknown,
    }
}

/// Build a report from an advertisement's fields
///
/// Returns `None` without an RSSI sample; such updates carry nothing to display.
pub fn discovery_report(
    id: String,
    local_name: Option<String>,
    rssi: Option<i16>,
) -> Option<DiscoveryReport> {
    rssi.map(|rssi| DiscoveryReport::new(id, local_name, rssi))
}

pub fn report_from_properties(
    id: String,
    properties: PeripheralProperties,
) -> Option<DiscoveryReport> {
    discovery_report(id, properties.local_name, properties.rssi)
}
