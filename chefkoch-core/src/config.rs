//! Integration configuration: which entries exist and which sensors they track.

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{SensorSpec, SensorType};

pub const DEFAULT_ENTRY_ID: &str = "chefkoch";
pub const DEFAULT_TITLE: &str = "Chefkoch";

/// Default update interval in hours.
pub const DEFAULT_UPDATE_INTERVAL_HOURS: u64 = 24;

/// Shortest accepted update interval in hours.
pub const MIN_UPDATE_INTERVAL_HOURS: u64 = 1;

/// Longest accepted update interval in hours (one year).
pub const MAX_UPDATE_INTERVAL_HOURS: u64 = 24 * 365;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Entry id must not be empty")]
    EmptyEntryId,

    #[error("Duplicate entry id: {0}")]
    DuplicateEntry(String),

    #[error("Entry {entry}: sensor id must not be empty")]
    EmptySensorId { entry: String },

    #[error("Entry {entry}: duplicate sensor id {sensor}")]
    DuplicateSensor { entry: String, sensor: String },

    #[error(
        "Entry {entry}: update interval must be at least {min} hour(s), got {hours}",
        min = MIN_UPDATE_INTERVAL_HOURS
    )]
    IntervalTooShort { entry: String, hours: u64 },

    #[error(
        "Entry {entry}: update interval must be at most {max} hours, got {hours}",
        max = MAX_UPDATE_INTERVAL_HOURS
    )]
    IntervalTooLong { entry: String, hours: u64 },

    #[error("Entry {entry}: search sensor {sensor} needs a query")]
    MissingQuery { entry: String, sensor: String },
}

/// Top level of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IntegrationConfig {
    /// Site root of the recipe source, if not chefkoch.de.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryConfig>,
}

/// One configured integration instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EntryConfig {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_update_interval_hours")]
    pub update_interval_hours: u64,
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorSpec>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_update_interval_hours() -> u64 {
    DEFAULT_UPDATE_INTERVAL_HOURS
}

/// The four sensors a fresh entry starts with.
pub fn default_sensors() -> Vec<SensorSpec> {
    vec![
        SensorSpec::new("random", SensorType::Random, "Chefkoch Random Recipe"),
        SensorSpec::new("daily", SensorType::Daily, "Chefkoch Daily Recipe"),
        SensorSpec::new("vegan", SensorType::Vegan, "Chefkoch Vegan Recipe"),
        SensorSpec::new("baking", SensorType::Baking, "Chefkoch Random Baking Recipe"),
    ]
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_ENTRY_ID.to_string(),
            title: default_title(),
            update_interval_hours: DEFAULT_UPDATE_INTERVAL_HOURS,
            sensors: default_sensors(),
        }
    }
}

impl EntryConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_hours.saturating_mul(3600))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::EmptyEntryId);
        }
        if self.update_interval_hours < MIN_UPDATE_INTERVAL_HOURS {
            return Err(ConfigError::IntervalTooShort {
                entry: self.id.clone(),
                hours: self.update_interval_hours,
            });
        }
        if self.update_interval_hours > MAX_UPDATE_INTERVAL_HOURS {
            return Err(ConfigError::IntervalTooLong {
                entry: self.id.clone(),
                hours: self.update_interval_hours,
            });
        }

        let mut seen = HashSet::new();
        for sensor in &self.sensors {
            if sensor.id.trim().is_empty() {
                return Err(ConfigError::EmptySensorId {
                    entry: self.id.clone(),
                });
            }
            if !seen.insert(sensor.id.as_str()) {
                return Err(ConfigError::DuplicateSensor {
                    entry: self.id.clone(),
                    sensor: sensor.id.clone(),
                });
            }
            if sensor.sensor_type == SensorType::Search && sensor.search.query.trim().is_empty() {
                return Err(ConfigError::MissingQuery {
                    entry: self.id.clone(),
                    sensor: sensor.id.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            entries: vec![EntryConfig::default()],
        }
    }
}

impl IntegrationConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `CHEFKOCH_CONFIG`: Config file path (default: "~/.chefkoch/config.json")
    /// - `CHEFKOCH_BASE_URL`: Recipe site root, overrides the file's `base_url`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::load(&Self::path_from_env())?;
        if let Ok(base_url) = env::var("CHEFKOCH_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = Some(base_url);
            }
        }
        Ok(config)
    }

    /// Config file path from `CHEFKOCH_CONFIG`, or the default path.
    pub fn path_from_env() -> PathBuf {
        env::var("CHEFKOCH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path())
    }

    /// Get the default config path: ~/.chefkoch/config.json
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".chefkoch").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    /// Read and validate a config file. A missing file gives the default
    /// single-entry configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            entry.validate()?;
            if !seen.insert(entry.id.as_str()) {
                return Err(ConfigError::DuplicateEntry(entry.id.clone()));
            }
        }
        Ok(())
    }
}
