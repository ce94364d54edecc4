//! Scan application: a manager plus the event feed the screen reads

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use blecentral_btle::BtleplugCapability;
use blecentral_core::{
    CentralScanManager, Device, PlatformCapability, ScanEvent, SubscriptionHandle, Topic,
};

use crate::config::AppConfig;
use crate::error::Result;
use crate::simulate;

/// A running scan manager and the adapter/lifecycle events it has published
pub struct ScanApp {
    config: AppConfig,
    manager: CentralScanManager,
    events: mpsc::UnboundedReceiver<ScanEvent>,
    subscriptions: Vec<SubscriptionHandle>,
    script: Option<JoinHandle<()>>,
}

impl ScanApp {
    /// Open the real adapter, or the scripted one when `simulate` is set
    pub async fn new(config: AppConfig, simulate: bool) -> Result<Self> {
        if simulate {
            info!("Using simulated Bluetooth adapter");
            let capability = simulate::simulated_capability();
            let driver = capability.clone();
            let interval = config.cli.refresh_interval() / 2;
            let mut app = Self::with_capability(config, capability);
            app.script = Some(simulate::spawn_script(driver, interval));
            Ok(app)
        } else {
            let capability = BtleplugCapability::new(config.btle.clone()).await?;
            Ok(Self::with_capability(config, capability))
        }
    }

    /// Wrap an already constructed capability
    pub fn with_capability<C: PlatformCapability>(config: AppConfig, capability: C) -> Self {
        let manager = CentralScanManager::spawn(capability, config.manager.clone());
        let (event_tx, events) = mpsc::unbounded_channel();

        let subscriptions = [Topic::AdapterStateChanged, Topic::ScanLifecycle]
            .into_iter()
            .map(|topic| {
                let event_tx = event_tx.clone();
                manager.subscribe(topic, move |event| {
                    let _ = event_tx.send(event.clone());
                })
            })
            .collect();

        Self {
            config,
            manager,
            events,
            subscriptions,
            script: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn manager(&self) -> &CentralScanManager {
        &self.manager
    }

    /// Next adapter or lifecycle event
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        self.events.recv().await
    }

    /// Adapter or lifecycle event already received, without waiting
    pub fn try_next_event(&mut self) -> Option<ScanEvent> {
        self.events.try_recv().ok()
    }

    /// Shut the manager down and return the last session's devices
    pub async fn shutdown(mut self) -> Vec<Device> {
        for handle in self.subscriptions.drain(..) {
            self.manager.unsubscribe(handle);
        }
        let devices = self.manager.shutdown().await;
        if let Some(script) = self.script.take() {
            script.abort();
        }
        debug!("Scan application shut down");
        devices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blecentral_core::{AdapterState, DiscoveryReport, SimulatedCapability};

    #[tokio::test]
    async fn test_forwards_lifecycle_events() {
        let capability = SimulatedCapability::with_state(AdapterState::PoweredOn);
        let mut app = ScanApp::with_capability(AppConfig::default(), capability.clone());

        app.manager().start().await.unwrap();
        capability
            .discover(DiscoveryReport::named("A", "Tag", -50))
            .unwrap();
        capability.set_adapter_state(AdapterState::PoweredOff).unwrap();
        assert!(!app.manager().is_scanning().await);

        assert_eq!(
            app.try_next_event(),
            Some(ScanEvent::ScanStarted { generation: 1 })
        );
        assert_eq!(
            app.try_next_event(),
            Some(ScanEvent::AdapterStateChanged(AdapterState::PoweredOff))
        );
        assert!(matches!(
            app.try_next_event(),
            Some(ScanEvent::ScanInterrupted { .. })
        ));
        assert_eq!(app.try_next_event(), None);

        let devices = app.shutdown().await;
        assert_eq!(devices.len(), 1);
        assert!(capability.is_released());
    }
}
