//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use scripted fake peripherals instead of a real adapter
    #[arg(long)]
    pub simulate: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the Bluetooth adapter state
    State,
    /// Scan for nearby devices and list them
    Scan {
        /// Scan duration in seconds (defaults to the configured duration)
        #[arg(short, long)]
        duration: Option<u64>,
        /// Keep scanning until Ctrl+C
        #[arg(short, long)]
        watch: bool,
    },
}
