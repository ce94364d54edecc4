//! Property tests for the registry, the adapter state mirror and the session controller

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use blecentral_core::session::{ScanEffect, ScanTrigger};
use blecentral_core::{
    AdapterState, AdapterStateTracker, DiscoveryRegistry, DiscoveryReport, EventBus,
    ScanSessionController, ScanState, Topic,
};
use proptest::prelude::*;

fn adapter_state() -> impl Strategy<Value = AdapterState> {
    prop::sample::select(AdapterState::ALL.to_vec())
}

fn report() -> impl Strategy<Value = DiscoveryReport> {
    (
        prop::sample::select(vec!["A", "B", "C", "D", "E"]),
        prop::option::of("[a-zA-Z ]{0,8}"),
        -100i16..0,
    )
        .prop_map(|(id, name, rssi)| DiscoveryReport::new(id, name, rssi))
}

fn trigger() -> impl Strategy<Value = ScanTrigger> {
    prop_oneof![
        adapter_state().prop_map(|adapter_state| ScanTrigger::Start { adapter_state }),
        Just(ScanTrigger::Stop),
        adapter_state().prop_map(|state| ScanTrigger::AdapterChanged { state }),
        (0u64..4).prop_map(|generation| ScanTrigger::PlatformFailed {
            generation,
            reason: "failed".into()
        }),
    ]
}

proptest! {
    #[test]
    fn registry_keeps_first_seen_order_and_last_rssi(reports in prop::collection::vec(report(), 0..64)) {
        let mut registry = DiscoveryRegistry::new();
        let mut first_seen: Vec<String> = Vec::new();
        let mut last_rssi: HashMap<String, i16> = HashMap::new();

        for report in reports {
            if !first_seen.contains(&report.id) {
                first_seen.push(report.id.clone());
            }
            last_rssi.insert(report.id.clone(), report.rssi);
            registry.report_device(report);
        }

        let snapshot = registry.snapshot();
        let ids: Vec<String> = snapshot.iter().map(|d| d.id.clone()).collect();
        prop_assert_eq!(ids, first_seen);
        for device in &snapshot {
            prop_assert_eq!(device.rssi, last_rssi[&device.id]);
            prop_assert!(!device.name.trim().is_empty());
        }
    }

    #[test]
    fn tracker_publishes_only_changes(states in prop::collection::vec(adapter_state(), 0..32)) {
        let bus = EventBus::new();
        let published = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&published);
        bus.subscribe(Topic::AdapterStateChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut tracker = AdapterStateTracker::new(bus);

        let mut expected = 0;
        let mut previous = AdapterState::Unknown;
        for state in states {
            if state != previous {
                expected += 1;
                previous = state;
            }
            tracker.on_capability_state_changed(state);
        }

        prop_assert_eq!(published.load(Ordering::SeqCst), expected);
        prop_assert_eq!(tracker.current_state(), previous);
    }

    #[test]
    fn controller_pairs_every_begin_with_one_end(triggers in prop::collection::vec(trigger(), 0..48)) {
        let mut controller = ScanSessionController::new();
        let mut begins = 0usize;
        let mut ends = 0usize;

        for trigger in triggers {
            if let Ok(transition) = controller.transition(trigger) {
                for effect in transition.effects.iter() {
                    match effect {
                        ScanEffect::BeginScan { .. } => begins += 1,
                        ScanEffect::EndScan => ends += 1,
                        _ => {}
                    }
                }
            }
            // The radio is running exactly when the controller says it is
            prop_assert_eq!(begins - ends, usize::from(controller.state() == ScanState::Scanning));
        }
        prop_assert_eq!(controller.generation() as usize, begins);
    }
}
