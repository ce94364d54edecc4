//! Command handlers for the blecentral CLI

use std::collections::VecDeque;
use std::time::Duration;

use tracing::info;

use crate::app::ScanApp;
use crate::cli::Commands;
use crate::error::Result;
use crate::view::{describe_event, render_adapter_state, render_device_list, CLEAR_SCREEN};

/// Lines of event history shown under the device list
const STATUS_LINES: usize = 5;

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(command: Commands, app: ScanApp) -> Result<()> {
        match command {
            Commands::State => Self::handle_state_command(app).await,
            Commands::Scan { duration, watch } => {
                let duration = duration
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| app.config().cli.scan_duration());
                Self::handle_scan_command(app, duration, watch).await
            }
        }
    }

    /// Handle the state command
    async fn handle_state_command(app: ScanApp) -> Result<()> {
        let state = app.manager().current_adapter_state().await;
        println!("{}", render_adapter_state(state));
        app.shutdown().await;
        Ok(())
    }

    /// Handle the scan command
    async fn handle_scan_command(mut app: ScanApp, duration: Duration, watch: bool) -> Result<()> {
        let manager = app.manager().clone();
        let cli_config = app.config().cli.clone();

        if let Err(e) = manager.start().await {
            app.shutdown().await;
            return Err(e.into());
        }

        if watch {
            info!("Scanning... Press Ctrl+C to stop");
        } else {
            info!("Scanning for {} seconds", duration.as_secs());
        }

        let mut status: VecDeque<String> = VecDeque::with_capacity(STATUS_LINES);
        let mut refresh = tokio::time::interval(cli_config.refresh_interval());
        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = refresh.tick() => {
                    let devices = manager.current_devices().await;
                    let scanning = manager.is_scanning().await;

                    print!("{}", CLEAR_SCREEN);
                    print!("{}", render_device_list(&devices, scanning, cli_config.show_unknown));
                    if !status.is_empty() {
                        println!();
                        for line in &status {
                            println!("{}", line);
                        }
                    }
                    if watch {
                        println!("\nPress Ctrl+C to stop...");
                    }

                    if !scanning {
                        break;
                    }
                }

                Some(event) = app.next_event() => {
                    if let Some(line) = describe_event(&event) {
                        info!("{}", line);
                        if status.len() == STATUS_LINES {
                            status.pop_front();
                        }
                        status.push_back(line);
                    }
                }

                _ = &mut deadline, if !watch => {
                    break;
                }

                _ = tokio::signal::ctrl_c() => {
                    break;
                }
            }
        }

        manager.stop().await;
        let devices = app.shutdown().await;

        println!();
        print!(
            "{}",
            render_device_list(&devices, false, cli_config.show_unknown)
        );
        Ok(())
    }
}
