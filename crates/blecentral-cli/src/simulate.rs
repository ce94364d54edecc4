//! Scripted fake peripherals for `--simulate`

use std::time::Duration;

use blecentral_core::{AdapterState, DiscoveryReport, SimulatedCapability};
use tokio::task::JoinHandle;
use tracing::debug;

/// A fake peripheral: id, advertised name and base signal strength
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakePeripheral {
    pub id: &'static str,
    pub name: Option<&'static str>,
    pub base_rssi: i16,
    /// Advertisement rounds before this peripheral first appears
    pub appears_after: u32,
}

pub const FAKE_PERIPHERALS: [FakePeripheral; 5] = [
    FakePeripheral {
        id: "C4:7C:8D:6A:01:11",
        name: Some("Heart Rate Strap"),
        base_rssi: -48,
        appears_after: 0,
    },
    FakePeripheral {
        id: "E2:15:90:3B:22:02",
        name: Some("Kitchen Thermometer"),
        base_rssi: -71,
        appears_after: 1,
    },
    FakePeripheral {
        id: "5A:9F:11:C0:33:03",
        name: None,
        base_rssi: -83,
        appears_after: 1,
    },
    FakePeripheral {
        id: "F0:08:D1:77:44:04",
        name: Some("Desk Lamp"),
        base_rssi: -62,
        appears_after: 2,
    },
    FakePeripheral {
        id: "3C:61:05:AE:55:05",
        name: Some("  "),
        base_rssi: -90,
        appears_after: 4,
    },
];

/// Reports emitted in advertisement round `round`
///
/// Signal strength drifts a few dBm between rounds.
pub fn advertisements(round: u32) -> Vec<DiscoveryReport> {
    FAKE_PERIPHERALS
        .iter()
        .filter(|p| round >= p.appears_after)
        .map(|p| {
            let drift = ((round + p.appears_after) % 5) as i16 - 2;
            DiscoveryReport::new(p.id, p.name.map(str::to_string), p.base_rssi + drift)
        })
        .collect()
}

/// Capability already powered on, ready for the manager
pub fn simulated_capability() -> SimulatedCapability {
    SimulatedCapability::with_state(AdapterState::PoweredOn)
}

/// Play advertisement rounds into `capability` every `interval` until the manager goes away
pub fn spawn_script(capability: SimulatedCapability, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let mut round = 0u32;
        loop {
            ticker.tick().await;
            for report in advertisements(round) {
                if capability.discover(report).is_err() {
                    debug!("Simulated script stopped after {} rounds", round);
                    return;
                }
            }
            round = round.wrapping_add(1);
        }
    })
}
