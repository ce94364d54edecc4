//! Text rendering of the device list screen

use std::fmt::Write as _;

use blecentral_core::{AdapterState, Device, InterruptCause, ScanEvent};

/// ANSI sequence that clears the terminal and homes the cursor
pub const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Render the device list
///
/// Shows a placeholder while a scan is running and nothing has been found yet.
pub fn render_device_list(devices: &[Device], scanning: bool, show_unknown: bool) -> String {
    let visible: Vec<&Device> = devices
        .iter()
        .filter(|device| show_unknown || !device.is_unnamed())
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "Devices Found ({})", visible.len());
    let _ = writeln!(out, "=================");

    if visible.is_empty() {
        if scanning {
            let _ = writeln!(out, "Scanning for devices...");
        } else {
            let _ = writeln!(out, "No devices found");
        }
        return out;
    }

    for device in visible {
        let _ = writeln!(out, "{}", device.name);
        let _ = writeln!(out, "  {}", device.id);
        let _ = writeln!(out, "  RSSI: {} dBm", device.rssi);
    }
    out
}

pub fn render_adapter_state(state: AdapterState) -> String {
    let availability = if state.is_powered_on() {
        "available"
    } else {
        "unavailable"
    };
    format!("Bluetooth adapter: {} ({})", state, availability)
}

/// One-line description of an adapter or lifecycle event
///
/// Device events are shown through the list instead and yield `None`.
pub fn describe_event(event: &ScanEvent) -> Option<String> {
    match event {
        ScanEvent::DeviceFound(_) => None,
        ScanEvent::AdapterStateChanged(state) => Some(format!("Adapter state changed: {}", state)),
        ScanEvent::ScanStarted { generation } => Some(format!("Scan #{} started", generation)),
        ScanEvent::ScanStopped { generation } => Some(format!("Scan #{} stopped", generation)),
        ScanEvent::ScanInterrupted { generation, cause } => {
            let reason = match cause {
                InterruptCause::AdapterDegraded(state) => format!("adapter became {}", state),
                InterruptCause::PlatformFailure(reason) => reason.clone(),
            };
            Some(format!("Scan #{} interrupted: {}", generation, reason))
        }
    }
}
