//! End-to-end tests of the manager task driven through a simulated capability

use std::sync::{Arc, Mutex};

use blecentral_core::{
    AdapterState, CapabilityCall, CentralScanManager, DiscoveryReport, InterruptCause,
    ManagerConfig, ScanError, ScanEvent, SessionEnd, SimulatedCapability, Topic,
};
use tokio_test::{assert_err, assert_ok};

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn powered_on_manager() -> (CentralScanManager, SimulatedCapability) {
    let capability = SimulatedCapability::with_state(AdapterState::PoweredOn);
    let manager = CentralScanManager::spawn(capability.clone(), ManagerConfig::testing());
    (manager, capability)
}

type EventLog = Arc<Mutex<Vec<ScanEvent>>>;

fn record_events(manager: &CentralScanManager) -> EventLog {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    for topic in [
        Topic::DeviceFound,
        Topic::AdapterStateChanged,
        Topic::ScanLifecycle,
    ] {
        let sink = Arc::clone(&log);
        manager.subscribe(topic, move |event| sink.lock().unwrap().push(event.clone()));
    }
    log
}

fn count(log: &EventLog, predicate: impl Fn(&ScanEvent) -> bool) -> usize {
    log.lock().unwrap().iter().filter(|e| predicate(e)).count()
}

// ----------------------------------------------------------------------------
// Start / Stop
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_start_rejected_while_powered_off() {
    let capability = SimulatedCapability::with_state(AdapterState::PoweredOff);
    let manager = CentralScanManager::spawn(capability.clone(), ManagerConfig::testing());

    let result = manager.start().await;

    assert_eq!(
        result,
        Err(ScanError::AdapterNotReady {
            current_state: AdapterState::PoweredOff
        })
    );
    assert!(manager.current_devices().await.is_empty());
    assert!(!manager.is_scanning().await);
    assert_eq!(capability.call_count(CapabilityCall::BeginScan), 0);
}

#[tokio::test]
async fn test_start_rejected_while_scanning() {
    let (manager, capability) = powered_on_manager();

    manager.start().await.unwrap();
    assert_eq!(manager.start().await, Err(ScanError::AlreadyScanning));
    assert_eq!(capability.call_count(CapabilityCall::BeginScan), 1);
}

#[tokio::test]
async fn test_start_after_adapter_powers_on() {
    let capability = SimulatedCapability::with_state(AdapterState::Unknown);
    let manager = CentralScanManager::spawn(capability.clone(), ManagerConfig::testing());

    assert!(!manager.is_adapter_available().await);
    capability
        .set_adapter_state(AdapterState::PoweredOn)
        .unwrap();

    assert!(manager.is_adapter_available().await);
    manager.start().await.unwrap();
    assert!(capability.is_scanning());
}

#[tokio::test]
async fn test_second_stop_is_silent() {
    let (manager, capability) = powered_on_manager();
    manager.start().await.unwrap();
    let log = record_events(&manager);

    manager.stop().await;
    manager.stop().await;

    assert_eq!(capability.call_count(CapabilityCall::EndScan), 1);
    assert_eq!(*log.lock().unwrap(), vec![ScanEvent::ScanStopped { generation: 1 }]);
    assert_eq!(manager.session_summary().await.end, Some(SessionEnd::Stopped));
}

#[tokio::test]
async fn test_restart_clears_previous_session() {
    let (manager, capability) = powered_on_manager();

    manager.start().await.unwrap();
    capability
        .discover(DiscoveryReport::named("X", "Old", -70))
        .unwrap();
    manager.stop().await;
    assert_eq!(manager.current_devices().await.len(), 1);

    manager.start().await.unwrap();
    capability
        .discover(DiscoveryReport::named("Y", "New", -50))
        .unwrap();

    let ids: Vec<String> = manager
        .current_devices()
        .await
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, vec!["Y".to_string()]);
    assert_eq!(manager.session_summary().await.generation, 2);
}

// ----------------------------------------------------------------------------
// Discovery
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_repeat_reports_update_in_place() {
    let (manager, capability) = powered_on_manager();
    manager.start().await.unwrap();

    capability.discover(DiscoveryReport::anonymous("A", -40)).unwrap();
    capability.discover(DiscoveryReport::named("B", "Watch", -60)).unwrap();
    capability.discover(DiscoveryReport::anonymous("A", -55)).unwrap();

    let devices = manager.current_devices().await;
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id, "A");
    assert_eq!(devices[0].rssi, -55);
    assert_eq!(devices[0].name, "Unknown");
    assert_eq!(devices[1].name, "Watch");
}

#[tokio::test]
async fn test_reports_while_idle_are_dropped() {
    let (manager, capability) = powered_on_manager();
    let found = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&found);
    manager.on_device_found(move |device| sink.lock().unwrap().push(device.id.clone()));

    capability.discover(DiscoveryReport::anonymous("early", -40)).unwrap();
    manager.start().await.unwrap();
    capability.discover(DiscoveryReport::anonymous("during", -40)).unwrap();
    manager.stop().await;
    capability.discover(DiscoveryReport::anonymous("late", -40)).unwrap();

    let devices = manager.current_devices().await;
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id, "during");
    assert_eq!(*found.lock().unwrap(), vec!["during".to_string()]);
}

// ----------------------------------------------------------------------------
// Adapter State
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_duplicate_state_reports_publish_once() {
    let capability = SimulatedCapability::with_state(AdapterState::Unknown);
    let manager = CentralScanManager::spawn(capability.clone(), ManagerConfig::testing());
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&states);
    manager.on_adapter_state_changed(move |state| sink.lock().unwrap().push(state));

    for _ in 0..5 {
        capability.set_adapter_state(AdapterState::PoweredOn).unwrap();
    }

    assert_eq!(manager.current_adapter_state().await, AdapterState::PoweredOn);
    assert_eq!(*states.lock().unwrap(), vec![AdapterState::PoweredOn]);
}

#[tokio::test]
async fn test_power_loss_forces_stop() {
    let (manager, capability) = powered_on_manager();
    manager.start().await.unwrap();
    capability.discover(DiscoveryReport::anonymous("A", -40)).unwrap();
    assert_eq!(manager.current_devices().await.len(), 1);
    let log = record_events(&manager);

    capability.set_adapter_state(AdapterState::PoweredOff).unwrap();

    assert!(!manager.is_scanning().await);
    assert_eq!(capability.call_count(CapabilityCall::EndScan), 1);
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ScanEvent::AdapterStateChanged(AdapterState::PoweredOff),
            ScanEvent::ScanInterrupted {
                generation: 1,
                cause: InterruptCause::AdapterDegraded(AdapterState::PoweredOff),
            },
        ]
    );
    // Interrupted results remain available
    assert_eq!(manager.current_devices().await.len(), 1);

    // A later stop has nothing left to do
    manager.stop().await;
    assert_eq!(capability.call_count(CapabilityCall::EndScan), 1);
}

#[tokio::test]
async fn test_platform_failure_interrupts_session() {
    let (manager, capability) = powered_on_manager();
    manager.start().await.unwrap();
    let log = record_events(&manager);

    capability.fail_scan("radio busy").unwrap();

    let summary = manager.session_summary().await;
    assert!(!summary.active);
    assert_eq!(
        summary.end,
        Some(SessionEnd::Interrupted(InterruptCause::PlatformFailure(
            "radio busy".into()
        )))
    );
    assert_eq!(
        count(&log, |e| matches!(e, ScanEvent::ScanInterrupted { .. })),
        1
    );
    // The adapter is still on, so a new session may begin
    assert_ok!(manager.start().await);
}

#[tokio::test]
async fn test_failure_from_previous_session_is_ignored() {
    let (manager, capability) = powered_on_manager();
    assert_ok!(manager.start().await);
    manager.stop().await;
    assert_ok!(manager.start().await);
    let log = record_events(&manager);

    // The first begin's failure arrives after the second session started
    assert_ok!(manager
        .capability_sender()
        .scan_failed(1, "Failed to start BLE scan: radio busy"));

    let summary = manager.session_summary().await;
    assert_eq!(summary.generation, 2);
    assert!(summary.active);
    assert_eq!(summary.end, None);
    assert!(capability.is_scanning());
    assert_eq!(
        capability.calls(),
        vec![
            CapabilityCall::Attach,
            CapabilityCall::BeginScan,
            CapabilityCall::EndScan,
            CapabilityCall::BeginScan,
        ]
    );
    assert_eq!(
        count(&log, |e| matches!(e, ScanEvent::ScanInterrupted { .. })),
        0
    );

    // A second start is still refused because session 2 is live
    assert_err!(manager.start().await);
}

// ----------------------------------------------------------------------------
// Subscriptions
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_panicking_subscriber_does_not_stop_manager() {
    let (manager, capability) = powered_on_manager();
    manager.on_scan_lifecycle(|_| panic!("subscriber failure"));
    let log = record_events(&manager);

    assert_ok!(manager.start().await);
    manager.stop().await;
    assert_ok!(manager.start().await);

    assert!(!manager.is_closed());
    assert_eq!(
        count(&log, |e| matches!(e, ScanEvent::ScanStarted { .. })),
        2
    );

    manager.shutdown().await;
    assert!(capability.is_released());
}

#[tokio::test]
async fn test_handler_unsubscribing_itself() {
    let (manager, capability) = powered_on_manager();
    let calls = Arc::new(Mutex::new(0usize));
    let handle_slot = Arc::new(Mutex::new(None));

    let handler_calls = Arc::clone(&calls);
    let handler_slot = Arc::clone(&handle_slot);
    let handler_manager = manager.clone();
    let handle = manager.on_device_found(move |_| {
        *handler_calls.lock().unwrap() += 1;
        if let Some(handle) = handler_slot.lock().unwrap().take() {
            handler_manager.unsubscribe(handle);
        }
    });
    *handle_slot.lock().unwrap() = Some(handle);

    manager.start().await.unwrap();
    capability.discover(DiscoveryReport::anonymous("A", -40)).unwrap();
    capability.discover(DiscoveryReport::anonymous("B", -40)).unwrap();
    manager.stop().await;

    assert_eq!(*calls.lock().unwrap(), 1);
    assert!(!manager.unsubscribe(handle));
}

#[tokio::test]
async fn test_lifecycle_events_in_order() {
    let (manager, _capability) = powered_on_manager();
    let lifecycle = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lifecycle);
    manager.on_scan_lifecycle(move |event| sink.lock().unwrap().push(event.clone()));

    manager.start().await.unwrap();
    manager.stop().await;
    manager.start().await.unwrap();

    assert_eq!(
        *lifecycle.lock().unwrap(),
        vec![
            ScanEvent::ScanStarted { generation: 1 },
            ScanEvent::ScanStopped { generation: 1 },
            ScanEvent::ScanStarted { generation: 2 },
        ]
    );
}

// ----------------------------------------------------------------------------
// Ordering and Shutdown
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_commands_and_notifications_processed_in_arrival_order() {
    let (manager, capability) = powered_on_manager();
    let log = record_events(&manager);

    manager.start().await.unwrap();
    capability.discover(DiscoveryReport::anonymous("A", -40)).unwrap();
    capability.set_adapter_state(AdapterState::Resetting).unwrap();
    capability.discover(DiscoveryReport::anonymous("B", -40)).unwrap();
    capability.set_adapter_state(AdapterState::PoweredOn).unwrap();
    manager.start().await.unwrap();
    capability.discover(DiscoveryReport::anonymous("C", -40)).unwrap();
    manager.stop().await;

    let names: Vec<&'static str> = log.lock().unwrap().iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec![
            "ScanStarted",
            "DeviceFound",
            "AdapterStateChanged",
            "ScanInterrupted",
            "AdapterStateChanged",
            "ScanStarted",
            "DeviceFound",
            "ScanStopped",
        ]
    );
    assert_eq!(
        capability.calls(),
        vec![
            CapabilityCall::Attach,
            CapabilityCall::BeginScan,
            CapabilityCall::EndScan,
            CapabilityCall::BeginScan,
            CapabilityCall::EndScan,
        ]
    );
}

#[tokio::test]
async fn test_shutdown_releases_once_and_closes() {
    let (manager, capability) = powered_on_manager();
    manager.start().await.unwrap();
    capability.discover(DiscoveryReport::anonymous("A", -40)).unwrap();
    assert_eq!(manager.current_devices().await.len(), 1);
    let log = record_events(&manager);

    let last = manager.shutdown().await;
    assert_eq!(last.len(), 1);
    assert_eq!(*log.lock().unwrap(), vec![ScanEvent::ScanStopped { generation: 1 }]);

    assert_eq!(manager.start().await, Err(ScanError::ManagerClosed));
    assert!(manager.shutdown().await.is_empty());
    manager.stop().await;
    assert_eq!(manager.current_adapter_state().await, AdapterState::Unknown);
    assert!(manager.current_devices().await.is_empty());

    assert_eq!(capability.call_count(CapabilityCall::Release), 1);
    assert!(!capability.is_attached());
    assert!(manager.is_closed());
}

#[tokio::test]
async fn test_audit_trail_records_transitions() {
    let (manager, capability) = powered_on_manager();

    manager.start().await.unwrap();
    capability.set_adapter_state(AdapterState::Unauthorized).unwrap();

    let trail = manager.audit_trail().await;
    let triggers: Vec<&str> = trail.iter().map(|e| e.trigger.as_str()).collect();
    assert_eq!(triggers, vec!["Start", "AdapterChanged"]);
    assert!(trail.iter().all(|e| e.generation == 1));
}
