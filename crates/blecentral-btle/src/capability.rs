//! btleplug-backed platform capability
//!
//! Scan commands are queued to a worker task that also drains the adapter's
//! central event stream. The worker runs commands one at a time, which gives the
//! in-order execution the scan manager relies on.

use std::pin::Pin;

use blecentral_core::{AdapterState, CapabilitySender, PlatformCapability};
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::stream::{Stream, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BtleCapabilityConfig;
use crate::convert::{adapter_state_from_central, report_from_properties};
use crate::error::{BtleCapabilityError, Result};

type CentralEvents = Pin<Box<dyn Stream<Item = CentralEvent> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerCommand {
    BeginScan(u64),
    EndScan,
    Release,
}

// ----------------------------------------------------------------------------
// Capability
// ----------------------------------------------------------------------------

/// Scan capability for a host adapter found through btleplug
pub struct BtleplugCapability {
    config: BtleCapabilityConfig,
    adapter: Adapter,
    adapter_info: String,
    initial_state: AdapterState,
    runtime: Handle,
    commands: Option<mpsc::UnboundedSender<WorkerCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl BtleplugCapability {
    /// Open the configured adapter and read its current state
    ///
    /// Must be called from within a tokio runtime; the worker task is spawned on it.
    pub async fn new(config: BtleCapabilityConfig) -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|e| BtleCapabilityError::ManagerUnavailable(e.to_string()))?;

        let adapters = manager
            .adapters()
            .await
            .map_err(|e| BtleCapabilityError::AdapterQueryFailed(e.to_string()))?;

        if adapters.is_empty() {
            return Err(BtleCapabilityError::NoAdapters);
        }
        let available = adapters.len();
        let adapter = adapters
            .into_iter()
            .nth(config.adapter_index)
            .ok_or(BtleCapabilityError::AdapterIndexOutOfRange {
                index: config.adapter_index,
                available,
            })?;

        let adapter_info = adapter
            .adapter_info()
            .await
            .unwrap_or_else(|_| format!("adapter {}", config.adapter_index));

        let initial_state = match adapter.adapter_state().await {
            Ok(state) => adapter_state_from_central(state),
            Err(e) => {
                warn!("Failed to read adapter state: {}", e);
                AdapterState::Unknown
            }
        };

        info!("BLE adapter initialized: {} ({})", adapter_info, initial_state);

        Ok(Self {
            config,
            adapter,
            adapter_info,
            initial_state,
            runtime: Handle::current(),
            commands: None,
            worker: None,
        })
    }

    /// Human-readable adapter description
    pub fn adapter_info(&self) -> &str {
        &self.adapter_info
    }

    pub fn config(&self) -> &BtleCapabilityConfig {
        &self.config
    }

    /// Whether the worker task is attached and still running
    pub fn is_attached(&self) -> bool {
        self.worker
            .as_ref()
            .map_or(false, |worker| !worker.is_finished())
    }

    fn send(&self, command: WorkerCommand) {
        match &self.commands {
            Some(commands) => {
                if commands.send(command).is_err() {
                    warn!("BLE worker is gone, dropping {:?}", command);
                }
            }
            None => warn!("BLE capability not attached, dropping {:?}", command),
        }
    }
}

impl PlatformCapability for BtleplugCapability {
    fn attach(&mut self, notifications: CapabilitySender) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let worker = ScanWorker {
            adapter: self.adapter.clone(),
            filter: ScanFilter {
                services: self.config.service_filter.clone(),
            },
            notifications,
            scanning: false,
        };

        self.worker = Some(self.runtime.spawn(worker.run(commands_rx)));
        self.commands = Some(commands_tx);
    }

    fn adapter_state(&self) -> AdapterState {
        self.initial_state
    }

    fn begin_scan(&mut self, generation: u64) {
        self.send(WorkerCommand::BeginScan(generation));
    }

    fn end_scan(&mut self) {
        self.send(WorkerCommand::EndScan);
    }

    fn release(&mut self) {
        self.send(WorkerCommand::Release);
        // The worker exits after stopping any scan; nothing waits on it
        self.commands = None;
        self.worker = None;
    }
}

// ----------------------------------------------------------------------------
// Worker
// ----------------------------------------------------------------------------

struct ScanWorker {
    adapter: Adapter,
    filter: ScanFilter,
    notifications: CapabilitySender,
    scanning: bool,
}

impl ScanWorker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<WorkerCommand>) {
        debug!("BLE worker starting");

        let mut events: Option<CentralEvents> = match self.adapter.events().await {
            Ok(events) => Some(events),
            Err(e) => {
                warn!("Failed to get BLE events: {}", e);
                None
            }
        };

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(WorkerCommand::BeginScan(generation)) => {
                            self.begin_scan(generation).await
                        }
                        Some(WorkerCommand::EndScan) => self.end_scan().await,
                        Some(WorkerCommand::Release) | None => break,
                    }
                }

                event = next_event(&mut events) => {
                    match event {
                        Some(event) => {
                            if !self.handle_central_event(event).await {
                                info!("Scan manager gone, stopping BLE worker");
                                break;
                            }
                        }
                        None => {
                            warn!("BLE event stream ended");
                            events = None;
                        }
                    }
                }
            }
        }

        if self.scanning {
            self.end_scan().await;
        }
        debug!("BLE worker stopped");
    }

    async fn begin_scan(&mut self, generation: u64) {
        match self.adapter.start_scan(self.filter.clone()).await {
            Ok(()) => {
                self.scanning = true;
                info!("Started BLE scanning for session {}", generation);
            }
            Err(e) => {
                warn!("Failed to start BLE scan for session {}: {}", generation, e);
                let _ = self
                    .notifications
                    .scan_failed(generation, format!("Failed to start BLE scan: {}", e));
            }
        }
    }

    async fn end_scan(&mut self) {
        if !self.scanning {
            return;
        }
        self.scanning = false;
        match self.adapter.stop_scan().await {
            Ok(()) => info!("Stopped BLE scanning"),
            Err(e) => warn!("Failed to stop BLE scan: {}", e),
        }
    }

    /// Forward one central event; returns false once the manager is gone
    async fn handle_central_event(&self, event: CentralEvent) -> bool {
        let delivered = match event {
            CentralEvent::StateUpdate(state) => self
                .notifications
                .adapter_state_changed(adapter_state_from_central(state)),
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                if !self.scanning {
                    return true;
                }
                match self.discovery_report(&id).await {
                    Some(report) => self.notifications.device_discovered(report),
                    None => return true,
                }
            }
            _ => return true,
        };
        delivered.is_ok()
    }

    async fn discovery_report(
        &self,
        id: &PeripheralId,
    ) -> Option<blecentral_core::DiscoveryReport> {
        let peripheral = self.adapter.peripheral(id).await.ok()?;
        match peripheral.properties().await {
            Ok(Some(properties)) => report_from_properties(id.to_string(), properties),
            Ok(None) => None,
            Err(e) => {
                debug!("Failed to read properties of {}: {}", id, e);
                None
            }
        }
    }
}

async fn next_event(events: &mut Option<CentralEvents>) -> Option<CentralEvent> {
    match events {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}
