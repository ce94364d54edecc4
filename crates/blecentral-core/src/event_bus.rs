//! Ordered, multi-subscriber event delivery
//!
//! Publishing is synchronous: every handler registered for the event's topic when
//! `publish` is called runs, in subscription order, before `publish` returns. The
//! subscriber list lock is released before any handler runs, so handlers may
//! subscribe or unsubscribe (themselves included) freely. A handler that panics
//! is logged and skipped; the remaining handlers still run.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::types::{AdapterState, Device};

// ----------------------------------------------------------------------------
// Events and Topics
// ----------------------------------------------------------------------------

/// Subscription topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    DeviceFound,
    AdapterStateChanged,
    ScanLifecycle,
}

/// Why a scan session ended without being asked to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptCause {
    /// The adapter left `poweredOn` while scanning
    AdapterDegraded(AdapterState),
    /// The platform reported that its scan command failed
    PlatformFailure(String),
}

impl fmt::Display for InterruptCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterruptCause::AdapterDegraded(state) => write!(f, "adapter became {}", state),
            InterruptCause::PlatformFailure(reason) => write!(f, "platform failure: {}", reason),
        }
    }
}

/// Events delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanEvent {
    /// A device was seen (first sighting or refreshed sample)
    DeviceFound(Device),
    /// The adapter reported a new state
    AdapterStateChanged(AdapterState),
    /// A scan session started
    ScanStarted { generation: u64 },
    /// A scan session was stopped on request
    ScanStopped { generation: u64 },
    /// A scan session was stopped by the manager itself
    ScanInterrupted {
        generation: u64,
        cause: InterruptCause,
    },
}

impl ScanEvent {
    pub fn topic(&self) -> Topic {
        match self {
            ScanEvent::DeviceFound(_) => Topic::DeviceFound,
            ScanEvent::AdapterStateChanged(_) => Topic::AdapterStateChanged,
            ScanEvent::ScanStarted { .. }
            | ScanEvent::ScanStopped { .. }
            | ScanEvent::ScanInterrupted { .. } => Topic::ScanLifecycle,
        }
    }

    /// Short variant name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ScanEvent::DeviceFound(_) => "DeviceFound",
            ScanEvent::AdapterStateChanged(_) => "AdapterStateChanged",
            ScanEvent::ScanStarted { .. } => "ScanStarted",
            ScanEvent::ScanStopped { .. } => "ScanStopped",
            ScanEvent::ScanInterrupted { .. } => "ScanInterrupted",
        }
    }
}

// ----------------------------------------------------------------------------
// Subscriptions
// ----------------------------------------------------------------------------

/// Callback invoked for each delivered event
pub type EventHandler = Arc<dyn Fn(&ScanEvent) + Send + Sync>;

/// Opaque handle identifying one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: u64,
    topic: Topic,
}

impl SubscriptionHandle {
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

struct Subscriber {
    id: u64,
    topic: Topic,
    handler: EventHandler,
    active: Arc<AtomicBool>,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<Subscriber>,
}

// ----------------------------------------------------------------------------
// Event Bus
// ----------------------------------------------------------------------------

/// Shared event bus; clones refer to the same subscriber list
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        // Handlers never run under this lock
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a handler for one topic
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionHandle
    where
        F: Fn(&ScanEvent) + Send + Sync + 'static,
    {
        let mut subscribers = self.lock();
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.entries.push(Subscriber {
            id,
            topic,
            handler: Arc::new(handler),
            active: Arc::new(AtomicBool::new(true)),
        });
        trace!("Subscribed handler {} to {:?}", id, topic);
        SubscriptionHandle { id, topic }
    }

    /// Remove a subscription; returns false if it was already gone
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut subscribers = self.lock();
        match subscribers.entries.iter().position(|s| s.id == handle.id) {
            Some(index) => {
                let removed = subscribers.entries.remove(index);
                // Skips the handler if a dispatch in progress has not reached it yet
                removed.active.store(false, Ordering::SeqCst);
                trace!("Unsubscribed handler {} from {:?}", handle.id, handle.topic);
                true
            }
            None => false,
        }
    }

    /// Deliver an event to every handler of its topic; returns how many handlers
    /// returned normally
    pub fn publish(&self, event: &ScanEvent) -> usize {
        let topic = event.topic();
        let targets: Vec<(EventHandler, Arc<AtomicBool>)> = self
            .lock()
            .entries
            .iter()
            .filter(|s| s.topic == topic)
            .map(|s| (Arc::clone(&s.handler), Arc::clone(&s.active)))
            .collect();

        let mut delivered = 0;
        for (handler, active) in targets {
            if !active.load(Ordering::SeqCst) {
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(_) => warn!("Handler for {} panicked", event.name()),
            }
        }
        trace!("Published {} to {} handlers", event.name(), delivered);
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn topic_subscriber_count(&self, topic: Topic) -> usize {
        self.lock().entries.iter().filter(|s| s.topic == topic).count()
    }
}
