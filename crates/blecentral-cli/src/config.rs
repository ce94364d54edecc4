//! blecentral CLI configuration
//!
//! Loaded from a TOML file with `[manager]`, `[btle]` and `[cli]` tables. Every
//! table and key is optional; missing values take their defaults.
//!
//! ```toml
//! [manager]
//! audit_history_len = 64
//!
//! [btle]
//! adapter_index = 0
//! service_filter = ["0000180d-0000-1000-8000-00805f9b34fb"]
//!
//! [cli]
//! scan_duration_secs = 15
//! log_level = "debug"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use blecentral_btle::BtleCapabilityConfig;
use blecentral_core::ManagerConfig;

use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub manager: ManagerConfig,
    pub btle: BtleCapabilityConfig,
    pub cli: CliConfig,
}

/// Presentation settings for the device list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// How long `scan` runs without `--duration`
    pub scan_duration_secs: u64,
    /// How often the device list is redrawn
    pub refresh_interval_ms: u64,
    /// Overrides the log level chosen from `--verbose`
    pub log_level: Option<String>,
    /// Whether devices without a name are listed
    pub show_unknown: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            scan_duration_secs: 10,
            refresh_interval_ms: 1000,
            log_level: None,
            show_unknown: true,
        }
    }
}

impl CliConfig {
    pub fn scan_duration(&self) -> Duration {
        Duration::from_secs(self.scan_duration_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

// ----------------------------------------------------------------------------
// Loading
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Load the user's configuration file if one exists, defaults otherwise
    pub fn load_default() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/blecentral/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("blecentral").join("config.toml"))
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.cli.refresh_interval_ms == 0 {
            return Err(CliError::Config(
                "refresh_interval_ms must be greater than 0".to_string(),
            ));
        }
        self.log_level()?;
        Ok(())
    }

    /// The configured log level, if any
    pub fn log_level(&self) -> Result<Option<tracing::Level>> {
        self.cli
            .log_level
            .as_deref()
            .map(|level| {
                tracing::Level::from_str(level)
                    .map_err(|_| CliError::Config(format!("Unknown log level: {}", level)))
            })
            .transpose()
    }
}
