//! Central Scan Manager
//!
//! [`CentralScanManager`] is a cloneable handle to a manager task that owns a
//! [`ScanCore`]. Every handle method becomes a message in the task's inbox, next to
//! the notifications the platform capability pushes, so the task sees one totally
//! ordered stream.
//!
//! The task ends when the manager is shut down or when every handle is dropped; in
//! both cases the capability is released exactly once.

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::capability::PlatformCapability;
use crate::channel::{
    create_inbox, CapabilitySender, InboxMessage, InboxReceiver, InboxSender, ManagerCommand,
};
use crate::config::ManagerConfig;
use crate::errors::{ScanError, ScanResult};
use crate::event_bus::{EventBus, ScanEvent, SubscriptionHandle, Topic};
use crate::scan_core::ScanCore;
use crate::session::{AuditEntry, SessionSummary};
use crate::types::{AdapterState, Device};

// ----------------------------------------------------------------------------
// Manager Task
// ----------------------------------------------------------------------------

/// Task body that drains the inbox into a [`ScanCore`]
pub struct ManagerTask<C: PlatformCapability> {
    core: ScanCore<C>,
    inbox: InboxReceiver,
}

impl<C: PlatformCapability> ManagerTask<C> {
    pub fn new(core: ScanCore<C>, inbox: InboxReceiver) -> Self {
        Self { core, inbox }
    }

    /// Process messages until shutdown or until every sender is gone
    pub async fn run(mut self) -> ScanCore<C> {
        debug!("Scan manager task starting");

        while let Some(message) = self.inbox.recv().await {
            match message {
                InboxMessage::Command(command) => {
                    if !self.core.handle_command(command) {
                        break;
                    }
                }
                InboxMessage::Capability(event) => {
                    debug!("Processing capability event {}", event.name());
                    self.core.on_capability_event(event);
                }
            }
        }

        if !self.core.is_released() {
            info!("All manager handles dropped, shutting down");
            self.core.shutdown();
        }
        self.inbox.close();
        debug!("Scan manager task stopped");
        self.core
    }
}

// ----------------------------------------------------------------------------
// Manager Handle
// ----------------------------------------------------------------------------

/// Application-facing handle to a running scan manager
#[derive(Debug, Clone)]
pub struct CentralScanManager {
    inbox: InboxSender,
    bus: EventBus,
}

impl CentralScanManager {
    /// Attach `capability`, poll its initial state, and spawn the manager task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<C: PlatformCapability>(capability: C, config: ManagerConfig) -> Self {
        let (manager, task) = Self::build(capability, config);
        tokio::spawn(task.run());
        manager
    }

    /// Like [`spawn`](Self::spawn), also returning the task's join handle
    ///
    /// The join handle resolves to the core once the task ends, which lets tests
    /// inspect the released capability.
    pub fn spawn_with_handle<C: PlatformCapability>(
        capability: C,
        config: ManagerConfig,
    ) -> (Self, JoinHandle<ScanCore<C>>) {
        let (manager, task) = Self::build(capability, config);
        let handle = tokio::spawn(task.run());
        (manager, handle)
    }

    /// Build the handle and its task without spawning
    pub fn build<C: PlatformCapability>(
        mut capability: C,
        config: ManagerConfig,
    ) -> (Self, ManagerTask<C>) {
        let (inbox_tx, inbox_rx) = create_inbox();
        let bus = EventBus::new();

        capability.attach(CapabilitySender::new(&inbox_tx));
        let core = ScanCore::new(capability, config, bus.clone());
        info!(
            "Scan manager created, adapter state {}",
            core.current_adapter_state()
        );

        let manager = Self {
            inbox: inbox_tx,
            bus,
        };
        (manager, ManagerTask::new(core, inbox_rx))
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ManagerCommand,
    ) -> Option<T> {
        let (reply, response) = oneshot::channel();
        self.inbox
            .send(InboxMessage::Command(command(reply)))
            .ok()?;
        response.await.ok()
    }

    // ---- Scanning ----

    /// Begin a new scan session, clearing the previous session's devices
    pub async fn start(&self) -> ScanResult<()> {
        self.request(|reply| ManagerCommand::Start { reply })
            .await
            .unwrap_or(Err(ScanError::ManagerClosed))
    }

    /// End the current scan session; does nothing while idle
    pub async fn stop(&self) {
        let _ = self.request(|reply| ManagerCommand::Stop { reply }).await;
    }

    /// Stop any scan, release the platform capability, and end the manager task
    ///
    /// Returns the devices of the last session. Later calls return an empty list.
    pub async fn shutdown(&self) -> Vec<Device> {
        self.request(|reply| ManagerCommand::Shutdown { reply })
            .await
            .unwrap_or_default()
    }

    // ---- Queries ----

    pub async fn current_adapter_state(&self) -> AdapterState {
        self.request(|reply| ManagerCommand::AdapterState { reply })
            .await
            .unwrap_or_default()
    }

    /// Whether the adapter can scan right now
    pub async fn is_adapter_available(&self) -> bool {
        self.current_adapter_state().await.is_powered_on()
    }

    /// Devices of the current or most recent session in first-seen order
    pub async fn current_devices(&self) -> Vec<Device> {
        self.request(|reply| ManagerCommand::Devices { reply })
            .await
            .unwrap_or_default()
    }

    pub async fn is_scanning(&self) -> bool {
        self.session_summary().await.active
    }

    pub async fn session_summary(&self) -> SessionSummary {
        self.request(|reply| ManagerCommand::Summary { reply })
            .await
            .unwrap_or_default()
    }

    /// Recent scan state transitions, oldest first
    pub async fn audit_trail(&self) -> Vec<AuditEntry> {
        self.request(|reply| ManagerCommand::AuditTrail { reply })
            .await
            .unwrap_or_default()
    }

    /// Whether the manager task has stopped accepting messages
    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }

    // ---- Subscriptions ----

    /// Register `handler` for events on `topic`
    ///
    /// Handlers run on the manager task; they must not block or await a reply from
    /// this manager.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionHandle
    where
        F: Fn(&ScanEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(topic, handler)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.bus.unsubscribe(handle)
    }

    pub fn on_device_found<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: Fn(&Device) + Send + Sync + 'static,
    {
        self.bus.subscribe(Topic::DeviceFound, move |event| {
            if let ScanEvent::DeviceFound(device) = event {
                handler(device);
            }
        })
    }

    pub fn on_adapter_state_changed<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: Fn(AdapterState) + Send + Sync + 'static,
    {
        self.bus.subscribe(Topic::AdapterStateChanged, move |event| {
            if let ScanEvent::AdapterStateChanged(state) = event {
                handler(*state);
            }
        })
    }

    /// Subscribe to `ScanStarted`, `ScanStopped` and `ScanInterrupted`
    pub fn on_scan_lifecycle<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: Fn(&ScanEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(Topic::ScanLifecycle, handler)
    }

    /// A notification sender into this manager's inbox
    pub fn capability_sender(&self) -> CapabilitySender {
        CapabilitySender::new(&self.inbox)
    }
}
