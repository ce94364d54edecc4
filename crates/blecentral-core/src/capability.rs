//! Platform Capability Trait
//!
//! Defines the interface the scan manager consumes from the host Bluetooth stack.
//! Concrete implementations live elsewhere: [`SimulatedCapability`] in this crate,
//! and a btleplug-backed one in `blecentral-btle`.
//!
//! [`SimulatedCapability`]: crate::simulated::SimulatedCapability

use crate::channel::CapabilitySender;
use crate::types::AdapterState;

/// Host adapter as seen by the scan manager
///
/// ## Contract
///
/// - `attach` is called exactly once, before any other method. The implementation
///   keeps the sender and pushes adapter state changes, discovery reports and
///   scan failures through it for as long as it lives.
/// - `begin_scan` and `end_scan` return immediately. Their effects must be applied
///   in the order they were issued, so an `end_scan` issued while a `begin_scan` is
///   still in flight leaves the radio idle once both resolve.
/// - Failures of a scan command are reported through
///   [`CapabilitySender::scan_failed`] with the generation passed to the failing
///   `begin_scan`, never by panicking. Failures for an older generation are ignored.
/// - `release` is called once when the manager shuts down; no other method is
///   called afterwards.
pub trait PlatformCapability: Send + 'static {
    /// Store the notification sender
    fn attach(&mut self, notifications: CapabilitySender);

    /// Current adapter state, polled once for the initial snapshot
    fn adapter_state(&self) -> AdapterState;

    /// Begin scanning for session `generation` (fire-and-forget)
    fn begin_scan(&mut self, generation: u64);

    /// End scanning (fire-and-forget)
    fn end_scan(&mut self);

    /// Release the underlying platform handle
    fn release(&mut self);
}

impl<T: PlatformCapability + ?Sized> PlatformCapability for Box<T> {
    fn attach(&mut self, notifications: CapabilitySender) {
        (**self).attach(notifications)
    }

    fn adapter_state(&self) -> AdapterState {
        (**self).adapter_state()
    }

    fn begin_scan(&mut self, generation: u64) {
        (**self).begin_scan(generation)
    }

    fn end_scan(&mut self) {
        (**self).end_scan()
    }

    fn release(&mut self) {
        (**self).release()
    }
}
