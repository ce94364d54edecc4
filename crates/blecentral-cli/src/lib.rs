//! blecentral CLI library
//!
//! Device list screen on top of the scan manager: argument parsing, TOML
//! configuration, the scripted simulator and text rendering.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod simulate;
pub mod view;

pub use app::ScanApp;
pub use cli::{Cli, Commands};
pub use config::AppConfig;
pub use error::{CliError, Result};
