//! Bot configuration loaded from RON.
//!
//! ```ron
//! (
//!     device: (adb_path: "adb", serial: None, assets_dir: "assets"),
//!     combat: (map: "3-4", kills_needed: 5, two_fleet: true),
//!     commissions: (enabled: true),
//!     missions: (enabled: true),
//!     retirement: (enabled: true, retire_cycle: 5),
//! )
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sortie_core::session::CombatConfig;
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// How to reach the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Path of the `adb` binary.
    #[serde(default = "default_adb_path")]
    pub adb_path: PathBuf,
    /// Device serial, when more than one device is attached.
    #[serde(default)]
    pub serial: Option<String>,
    /// Directory holding the template PNGs.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            serial: None,
            assets_dir: default_assets_dir(),
        }
    }
}

fn default_adb_path() -> PathBuf {
    PathBuf::from("adb")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

/// Toggle for a cycle without further settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CycleToggle {
    /// Whether the cycle runs.
    #[serde(default)]
    pub enabled: bool,
}

/// Retirement settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirementConfig {
    /// Whether the cycle runs.
    #[serde(default)]
    pub enabled: bool,
    /// Retire after every this many completed sorties.
    #[serde(default = "default_retire_cycle")]
    pub retire_cycle: u32,
}

impl Default for RetirementConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            retire_cycle: default_retire_cycle(),
        }
    }
}

fn default_retire_cycle() -> u32 {
    5
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Device connection.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Combat cycle.
    pub combat: CombatConfig,
    /// Commission cycle.
    #[serde(default)]
    pub commissions: CycleToggle,
    /// Mission cycle.
    #[serde(default)]
    pub missions: CycleToggle,
    /// Retirement cycle.
    #[serde(default)]
    pub retirement: RetirementConfig,
}

impl BotConfig {
    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a configuration string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: BotConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the types cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.combat
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.retirement.retire_cycle == 0 {
            return Err(ConfigError::Invalid(
                "retirement.retire_cycle must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
