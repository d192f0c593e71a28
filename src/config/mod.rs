//! # Configuration Management Module
//!
//! Configuration is read once at startup. Every section and field has a
//! default, so a partial file (or none at all) still yields a usable config.
//!
//! ## Configuration Structure
//!
//! - [`BaseConfig`] - Home base identity and reference coordinates
//! - [`MeshtasticConfig`] - Device communication settings
//! - [`LoggingConfig`] - Logging settings
//!
//! ## Configuration File Format
//!
//! TOML is the native format. A path ending in `.json` is read as JSON with
//! the same structure.
//!
//! ```toml
//! [base]
//! base_id = "HOME"
//! base_lat = -33.9249
//! base_long = 18.4241
//!
//! [meshtastic]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! channel = 0
//!
//! [logging]
//! level = "info"
//! file = "logs/mesh_helper.log"
//! ```

use crate::geo::ReferencePoint;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub base: BaseConfig,
    #[serde(default)]
    pub meshtastic: MeshtasticConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The home base every distance is measured from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseConfig {
    /// Informational label for the base node
    pub base_id: String,
    pub base_lat: f64,
    pub base_long: f64,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            base_id: "UNKNOWN".to_string(),
            base_lat: 0.0,
            base_long: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshtasticConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Channel index replies are sent on (0 = primary)
    pub channel: u32,
    /// Seconds between serial API heartbeats (0 disables)
    pub heartbeat_interval_secs: u64,
}

impl Default for MeshtasticConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
            channel: 0,
            heartbeat_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("logs/mesh_helper.log".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Parsed `level`, falling back to `Info` for unknown names.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;
        Self::parse(path, &content)
    }

    /// Parse config text; `path` selects JSON when it ends in `.json`.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if is_json(path) {
            serde_json::from_str(content)
                .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))
        } else {
            toml::from_str(content)
                .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))
        }
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = if is_json(path) {
            serde_json::to_string_pretty(&config)
                .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?
        } else {
            toml::to_string_pretty(&config)
                .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?
        };
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;
        Ok(())
    }

    pub fn reference_point(&self) -> ReferencePoint {
        ReferencePoint::new(self.base.base_lat, self.base.base_long)
    }
}

fn is_json(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
