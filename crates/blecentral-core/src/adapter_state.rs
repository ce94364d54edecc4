//! Adapter state mirror

use tracing::debug;

use crate::event_bus::{EventBus, ScanEvent};
use crate::types::AdapterState;

/// Mirrors the adapter state reported by the platform capability
///
/// Repeated identical reports are absorbed; only real changes reach subscribers.
#[derive(Debug)]
pub struct AdapterStateTracker {
    current: AdapterState,
    bus: EventBus,
}

impl AdapterStateTracker {
    /// Start in `unknown` until the first report arrives
    pub fn new(bus: EventBus) -> Self {
        Self {
            current: AdapterState::Unknown,
            bus,
        }
    }

    pub fn current_state(&self) -> AdapterState {
        self.current
    }

    /// Record a reported state; returns true if it differed from the previous one
    pub fn on_capability_state_changed(&mut self, new: AdapterState) -> bool {
        if new == self.current {
            return false;
        }
        debug!("Adapter state {} -> {}", self.current, new);
        self.current = new;
        self.bus.publish(&ScanEvent::AdapterStateChanged(new));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::Topic;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_bus() -> (EventBus, Arc<AtomicUsize>) {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        bus.subscribe(Topic::AdapterStateChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (bus, count)
    }

    #[test]
    fn test_initial_state_is_unknown() {
        let tracker = AdapterStateTracker::new(EventBus::new());
        assert_eq!(tracker.current_state(), AdapterState::Unknown);
    }

    #[test]
    fn test_duplicate_reports_notify_once() {
        let (bus, count) = counting_bus();
        let mut tracker = AdapterStateTracker::new(bus);

        assert!(tracker.on_capability_state_changed(AdapterState::PoweredOn));
        assert!(!tracker.on_capability_state_changed(AdapterState::PoweredOn));
        assert!(!tracker.on_capability_state_changed(AdapterState::PoweredOn));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.current_state(), AdapterState::PoweredOn);
    }

    #[test]
    fn test_unknown_report_on_fresh_tracker_is_silent() {
        let (bus, count) = counting_bus();
        let mut tracker = AdapterStateTracker::new(bus);

        assert!(!tracker.on_capability_state_changed(AdapterState::Unknown));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
