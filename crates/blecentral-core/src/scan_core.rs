//! Scan Core State
//!
//! Owns every component of the scan manager and applies commands and capability
//! notifications to them. `ScanCore` itself is synchronous and single-threaded;
//! [`CentralScanManager`](crate::CentralScanManager) runs one inside a task and
//! feeds it from the inbox.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::adapter_state::AdapterStateTracker;
use crate::capability::PlatformCapability;
use crate::channel::{CapabilityEvent, ManagerCommand};
use crate::config::ManagerConfig;
use crate::errors::ScanError;
use crate::event_bus::{EventBus, ScanEvent};
use crate::registry::RegistryUpdate;
use crate::session::{
    AuditEntry, ScanEffect, ScanSession, ScanSessionController, ScanState, ScanTransition,
    ScanTrigger, SessionEnd, SessionSummary,
};
use crate::types::{AdapterState, Device, DiscoveryReport};

/// Counters kept for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreStats {
    pub reports_accepted: u64,
    pub reports_dropped: u64,
    pub transitions: u64,
    pub rejected_starts: u64,
}

/// Composition of tracker, controller, registry and bus around one capability
pub struct ScanCore<C: PlatformCapability> {
    config: ManagerConfig,
    bus: EventBus,
    tracker: AdapterStateTracker,
    controller: ScanSessionController,
    session: ScanSession,
    capability: C,
    audit_trail: VecDeque<AuditEntry>,
    stats: CoreStats,
    released: bool,
}

impl<C: PlatformCapability> ScanCore<C> {
    /// Build the core and take the capability's initial state snapshot
    ///
    /// The capability should already be attached to a notification sender.
    pub fn new(capability: C, config: ManagerConfig, bus: EventBus) -> Self {
        let mut core = Self {
            config,
            tracker: AdapterStateTracker::new(bus.clone()),
            bus,
            controller: ScanSessionController::new(),
            session: ScanSession::default(),
            capability,
            audit_trail: VecDeque::new(),
            stats: CoreStats::default(),
            released: false,
        };
        let initial = core.capability.adapter_state();
        core.tracker.on_capability_state_changed(initial);
        core
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Begin a new scan session
    pub fn start(&mut self) -> Result<(), ScanError> {
        if self.released {
            return Err(ScanError::ManagerClosed);
        }
        let trigger = ScanTrigger::Start {
            adapter_state: self.tracker.current_state(),
        };
        match self.controller.transition(trigger) {
            Ok(transition) => {
                self.apply(transition);
                info!("Scan session {} started", self.controller.generation());
                Ok(())
            }
            Err(e) => {
                self.stats.rejected_starts += 1;
                debug!("Start rejected: {}", e);
                Err(e)
            }
        }
    }

    /// End the current scan session; a no-op while idle
    pub fn stop(&mut self) {
        let was_scanning = self.controller.is_scanning();
        self.run_trigger(ScanTrigger::Stop);
        if was_scanning {
            info!("Scan session {} stopped", self.controller.generation());
        }
    }

    /// Stop any active scan and release the capability; idempotent
    pub fn shutdown(&mut self) -> Vec<Device> {
        if self.released {
            return self.current_devices();
        }
        self.stop();
        self.capability.release();
        self.released = true;
        info!("Scan manager shut down");
        self.current_devices()
    }

    /// Handle one application command; returns false once the core has shut down
    pub fn handle_command(&mut self, command: ManagerCommand) -> bool {
        debug!("Processing command {}", command.name());
        // Reply failures only mean the caller stopped waiting
        match command {
            ManagerCommand::Start { reply } => {
                let _ = reply.send(self.start());
            }
            ManagerCommand::Stop { reply } => {
                self.stop();
                let _ = reply.send(());
            }
            ManagerCommand::AdapterState { reply } => {
                let _ = reply.send(self.current_adapter_state());
            }
            ManagerCommand::Devices { reply } => {
                let _ = reply.send(self.current_devices());
            }
            ManagerCommand::Summary { reply } => {
                let _ = reply.send(self.summary());
            }
            ManagerCommand::AuditTrail { reply } => {
                let _ = reply.send(self.audit_trail());
            }
            ManagerCommand::Shutdown { reply } => {
                let _ = reply.send(self.shutdown());
            }
        }
        !self.released
    }

    // ------------------------------------------------------------------------
    // Capability Notifications
    // ------------------------------------------------------------------------

    pub fn on_capability_event(&mut self, event: CapabilityEvent) {
        match event {
            CapabilityEvent::AdapterStateChanged(state) => self.on_adapter_state_changed(state),
            CapabilityEvent::DeviceDiscovered(report) => self.on_device_discovered(report),
            CapabilityEvent::ScanFailed { generation, reason } => {
                self.on_scan_failed(generation, reason)
            }
        }
    }

    /// Mirror a reported adapter state, forcing a stop if scanning can no longer continue
    pub fn on_adapter_state_changed(&mut self, state: AdapterState) {
        if !self.tracker.on_capability_state_changed(state) {
            return;
        }
        if self.controller.is_scanning() && !state.is_powered_on() {
            warn!(
                "Adapter became {} during scan session {}, stopping",
                state,
                self.controller.generation()
            );
        }
        self.run_trigger(ScanTrigger::AdapterChanged { state });
    }

    /// Merge a discovery report into the active session
    pub fn on_device_discovered(&mut self, report: DiscoveryReport) {
        if !self.controller.is_scanning() {
            self.stats.reports_dropped += 1;
            debug!("Dropping report for {} outside a scan session", report.id);
            return;
        }

        let (device, update) = self.session.registry.report_device(report);
        self.stats.reports_accepted += 1;
        if update == RegistryUpdate::Inserted {
            debug!("Discovered {}", device);
        }
        if update == RegistryUpdate::Inserted || self.config.emit_device_updates {
            self.bus.publish(&ScanEvent::DeviceFound(device));
        }
    }

    /// The platform could not begin the scan for session `generation`
    pub fn on_scan_failed(&mut self, generation: u64, reason: String) {
        if !self.controller.is_scanning() {
            debug!("Ignoring scan failure while idle: {}", reason);
        } else if generation != self.controller.generation() {
            debug!(
                "Ignoring scan failure from session {} during session {}: {}",
                generation,
                self.controller.generation(),
                reason
            );
        } else {
            warn!("Platform scan failure in session {}: {}", generation, reason);
        }
        self.run_trigger(ScanTrigger::PlatformFailed { generation, reason });
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn current_adapter_state(&self) -> AdapterState {
        self.tracker.current_state()
    }

    pub fn current_devices(&self) -> Vec<Device> {
        self.session.registry.snapshot()
    }

    pub fn scan_state(&self) -> ScanState {
        self.controller.state()
    }

    pub fn is_scanning(&self) -> bool {
        self.controller.is_scanning()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            generation: self.controller.generation(),
            active: self.controller.is_scanning(),
            device_count: self.session.registry.len(),
            end: self.session.end.clone(),
        }
    }

    pub fn audit_trail(&self) -> Vec<AuditEntry> {
        self.audit_trail.iter().cloned().collect()
    }

    pub fn stats(&self) -> CoreStats {
        self.stats
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }

    // ------------------------------------------------------------------------
    // Effect Execution
    // ------------------------------------------------------------------------

    fn run_trigger(&mut self, trigger: ScanTrigger) {
        // Only start can be rejected
        if let Ok(transition) = self.controller.transition(trigger) {
            self.apply(transition);
        }
    }

    fn apply(&mut self, transition: ScanTransition) {
        if transition.effects.is_empty() {
            return;
        }
        debug!("Scan transition {}", transition.audit_entry);
        self.stats.transitions += 1;
        self.record_audit(transition.audit_entry);

        for effect in transition.effects {
            match effect {
                ScanEffect::ClearRegistry => self.session.registry.clear(),
                ScanEffect::BeginScan { generation } => self.capability.begin_scan(generation),
                ScanEffect::EndScan => self.capability.end_scan(),
                ScanEffect::Emit(event) => {
                    self.session.end = match &event {
                        ScanEvent::ScanStarted { .. } => None,
                        ScanEvent::ScanStopped { .. } => Some(SessionEnd::Stopped),
                        ScanEvent::ScanInterrupted { cause, .. } => {
                            Some(SessionEnd::Interrupted(cause.clone()))
                        }
                        _ => self.session.end.take(),
                    };
                    self.bus.publish(&event);
                }
            }
        }
    }

    fn record_audit(&mut self, entry: AuditEntry) {
        if self.config.audit_history_len == 0 {
            return;
        }
        while self.audit_trail.len() >= self.config.audit_history_len {
            self.audit_trail.pop_front();
        }
        self.audit_trail.push_back(entry);
    }
}
