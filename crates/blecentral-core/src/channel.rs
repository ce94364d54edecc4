//! Manager Inbox Protocol
//!
//! All state mutation goes through one inbox owned by the manager task. Callers
//! enqueue [`ManagerCommand`]s through the manager handle; platform capabilities
//! enqueue [`CapabilityEvent`]s through a [`CapabilitySender`]. Both share the same
//! queue, so they are processed strictly in arrival order.

use tokio::sync::{mpsc, oneshot};

use crate::errors::{ChannelError, ScanError};
use crate::session::{AuditEntry, SessionSummary};
use crate::types::{AdapterState, Device, DiscoveryReport};

// ----------------------------------------------------------------------------
// Command: Application → Manager
// ----------------------------------------------------------------------------

/// Requests issued by the application, each with a reply channel
#[derive(Debug)]
pub enum ManagerCommand {
    Start {
        reply: oneshot::Sender<Result<(), ScanError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    AdapterState {
        reply: oneshot::Sender<AdapterState>,
    },
    Devices {
        reply: oneshot::Sender<Vec<Device>>,
    },
    Summary {
        reply: oneshot::Sender<SessionSummary>,
    },
    AuditTrail {
        reply: oneshot::Sender<Vec<AuditEntry>>,
    },
    Shutdown {
        reply: oneshot::Sender<Vec<Device>>,
    },
}

impl ManagerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ManagerCommand::Start { .. } => "Start",
            ManagerCommand::Stop { .. } => "Stop",
            ManagerCommand::AdapterState { .. } => "AdapterState",
            ManagerCommand::Devices { .. } => "Devices",
            ManagerCommand::Summary { .. } => "Summary",
            ManagerCommand::AuditTrail { .. } => "AuditTrail",
            ManagerCommand::Shutdown { .. } => "Shutdown",
        }
    }
}

// ----------------------------------------------------------------------------
// CapabilityEvent: Platform → Manager
// ----------------------------------------------------------------------------

/// Notifications from the platform capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityEvent {
    /// The adapter's power/authorization state changed
    AdapterStateChanged(AdapterState),
    /// An advertisement was observed
    DeviceDiscovered(DiscoveryReport),
    /// The begin issued for session `generation` failed
    ScanFailed { generation: u64, reason: String },
}

impl CapabilityEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CapabilityEvent::AdapterStateChanged(_) => "AdapterStateChanged",
            CapabilityEvent::DeviceDiscovered(_) => "DeviceDiscovered",
            CapabilityEvent::ScanFailed { .. } => "ScanFailed",
        }
    }
}

// ----------------------------------------------------------------------------
// Inbox
// ----------------------------------------------------------------------------

/// Everything the manager task consumes
#[derive(Debug)]
pub enum InboxMessage {
    Command(ManagerCommand),
    Capability(CapabilityEvent),
}

pub type InboxSender = mpsc::UnboundedSender<InboxMessage>;
pub type InboxReceiver = mpsc::UnboundedReceiver<InboxMessage>;
type WeakInboxSender = mpsc::WeakUnboundedSender<InboxMessage>;

pub fn create_inbox() -> (InboxSender, InboxReceiver) {
    mpsc::unbounded_channel()
}

/// Handle a platform capability uses to push notifications
///
/// Sending never blocks or awaits, so it is safe from vendor callback threads.
/// The inbox reference is weak: a capability holding this sender does not keep
/// the manager alive once every application handle is gone.
#[derive(Debug, Clone)]
pub struct CapabilitySender {
    inbox: WeakInboxSender,
}

impl CapabilitySender {
    pub fn new(inbox: &InboxSender) -> Self {
        Self {
            inbox: inbox.downgrade(),
        }
    }

    pub fn send(&self, event: CapabilityEvent) -> Result<(), ChannelError> {
        let inbox = self.inbox.upgrade().ok_or(ChannelError::ChannelClosed)?;
        inbox
            .send(InboxMessage::Capability(event))
            .map_err(|_| ChannelError::ReceiverDropped)
    }

    pub fn adapter_state_changed(&self, state: AdapterState) -> Result<(), ChannelError> {
        self.send(CapabilityEvent::AdapterStateChanged(state))
    }

    pub fn device_discovered(&self, report: DiscoveryReport) -> Result<(), ChannelError> {
        self.send(CapabilityEvent::DeviceDiscovered(report))
    }

    /// Report that the `begin_scan` for `generation` failed
    pub fn scan_failed(
        &self,
        generation: u64,
        reason: impl Into<String>,
    ) -> Result<(), ChannelError> {
        self.send(CapabilityEvent::ScanFailed {
            generation,
            reason: reason.into(),
        })
    }

    /// Whether the manager is gone
    pub fn is_closed(&self) -> bool {
        self.inbox
            .upgrade()
            .map_or(true, |inbox| inbox.is_closed())
    }
}
