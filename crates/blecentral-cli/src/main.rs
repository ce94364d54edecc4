//! blecentral CLI entry point

use clap::Parser;
use tracing::{error, info};

use blecentral_cli::{
    app::ScanApp, cli::Cli, commands::CommandDispatcher, config::AppConfig, error::Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration before logging so it can choose the level
    let config = load_configuration(&cli)?;
    setup_logging(cli.verbose, config.log_level()?);
    match &cli.config {
        Some(path) => info!("Loaded configuration from: {}", path),
        None => info!("Using default configuration"),
    }

    let app = match ScanApp::new(config, cli.simulate).await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to open Bluetooth adapter: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = CommandDispatcher::execute(cli.command, app).await {
        error!("Command execution failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Setup logging from verbosity, overridden by the configured level
fn setup_logging(verbose: bool, configured: Option<tracing::Level>) {
    let log_level = configured.unwrap_or(if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    });

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Load configuration from the given file, the user's config file, or defaults
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(config_path) => AppConfig::load_from_file(config_path),
        None => AppConfig::load_default(),
    }
}
