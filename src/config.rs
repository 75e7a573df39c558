//! Configuration management for Hestia
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files. Every section has defaults, so a config file
//! only needs the keys it wants to change.

use crate::error::{HestiaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "HESTIA_CONFIG";

/// Locations searched by [`Config::load`] when no explicit path is given
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["hestia.yaml", "/etc/hestia/config.yaml"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Charger policy applied to newly registered records
    pub charger: ChargerConfig,

    /// Session store location
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Charger policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargerConfig {
    /// Ceiling of the household supply circuit in kW, applied to records
    /// registered without their own limit. This is a site policy on top of the
    /// hardware check: a request above it is refused even when it is below the
    /// charger's `max_power_output_kw`.
    pub supply_limit_kw: f64,

    /// Completed charging intervals retained per charger
    pub history_limit: usize,
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON session store
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console level override
    pub console_level: Option<String>,

    /// Optional file level override
    pub file_level: Option<String>,

    /// Directory for daily rotated log files; no file logging when unset
    pub file: Option<String>,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `HESTIA_CONFIG` or the default locations
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(path);
        }

        for path in &DEFAULT_CONFIG_PATHS {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Self::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.charger.supply_limit_kw.is_finite() && self.charger.supply_limit_kw > 0.0) {
            return Err(HestiaError::validation(
                "charger.supply_limit_kw",
                "Must be positive",
            ));
        }

        if self.storage.path.trim().is_empty() {
            return Err(HestiaError::validation(
                "storage.path",
                "Path cannot be empty",
            ));
        }

        crate::logging::parse_log_level(&self.logging.level)
            .map_err(|_| HestiaError::validation("logging.level", "Unknown log level"))?;

        Ok(())
    }
}
