//! In-memory platform capability
//!
//! Records every call the manager makes and lets a test (or a demo) play the role
//! of the platform callback thread. Clones share state, so one clone can be handed
//! to the manager while another drives and inspects it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::capability::PlatformCapability;
use crate::channel::CapabilitySender;
use crate::errors::ChannelError;
use crate::types::{AdapterState, DiscoveryReport};

/// A call made by the manager on the capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityCall {
    Attach,
    BeginScan,
    EndScan,
    Release,
}

#[derive(Debug, Default)]
struct SimulatedState {
    adapter_state: AdapterState,
    scanning: bool,
    generation: u64,
    calls: Vec<CapabilityCall>,
    notifications: Option<CapabilitySender>,
}

/// Scriptable capability for tests and hardware-free demos
#[derive(Debug, Clone, Default)]
pub struct SimulatedCapability {
    inner: Arc<Mutex<SimulatedState>>,
}

impl SimulatedCapability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capability whose initial polled state is `state`
    pub fn with_state(state: AdapterState) -> Self {
        let capability = Self::new();
        capability.lock().adapter_state = state;
        capability
    }

    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sender(&self) -> Result<CapabilitySender, ChannelError> {
        self.lock()
            .notifications
            .clone()
            .ok_or(ChannelError::ChannelClosed)
    }

    /// Report a new adapter state, as the platform callback would
    pub fn set_adapter_state(&self, state: AdapterState) -> Result<(), ChannelError> {
        self.lock().adapter_state = state;
        self.sender()?.adapter_state_changed(state)
    }

    /// Report an advertisement
    pub fn discover(&self, report: DiscoveryReport) -> Result<(), ChannelError> {
        self.sender()?.device_discovered(report)
    }

    /// Report that the most recent `begin_scan` failed
    pub fn fail_scan(&self, reason: impl Into<String>) -> Result<(), ChannelError> {
        let generation = self.lock().generation;
        self.fail_scan_for(generation, reason)
    }

    /// Report that the `begin_scan` for `generation` failed
    ///
    /// The radio only stops if `generation` is the one it is scanning for.
    pub fn fail_scan_for(
        &self,
        generation: u64,
        reason: impl Into<String>,
    ) -> Result<(), ChannelError> {
        {
            let mut state = self.lock();
            if state.generation == generation {
                state.scanning = false;
            }
        }
        self.sender()?.scan_failed(generation, reason)
    }

    /// Generation passed to the most recent `begin_scan`
    pub fn last_generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn calls(&self) -> Vec<CapabilityCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, call: CapabilityCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Whether the simulated radio is currently scanning
    pub fn is_scanning(&self) -> bool {
        self.lock().scanning
    }

    pub fn is_attached(&self) -> bool {
        self.lock().notifications.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.call_count(CapabilityCall::Release) > 0
    }
}

impl PlatformCapability for SimulatedCapability {
    fn attach(&mut self, notifications: CapabilitySender) {
        let mut state = self.lock();
        state.calls.push(CapabilityCall::Attach);
        state.notifications = Some(notifications);
    }

    fn adapter_state(&self) -> AdapterState {
        self.lock().adapter_state
    }

    fn begin_scan(&mut self, generation: u64) {
        debug!("Simulated scan {} started", generation);
        let mut state = self.lock();
        state.calls.push(CapabilityCall::BeginScan);
        state.scanning = true;
        state.generation = generation;
    }

    fn end_scan(&mut self) {
        debug!("Simulated scan stopped");
        let mut state = self.lock();
        state.calls.push(CapabilityCall::EndScan);
        state.scanning = false;
    }

    fn release(&mut self) {
        let mut state = self.lock();
        state.calls.push(CapabilityCall::Release);
        state.scanning = false;
        state.notifications = None;
    }
}
