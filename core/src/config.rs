//! Configuration management for search defaults.
//!
//! Stores configuration in JSON format at `~/.portfinder/config.json`.
//! Only the defaults used to build a [`ProbeRequest`] live here; ports
//! that were found are never written back.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::{ProbeRequest, DEFAULT_ADDRESS};
use crate::error::{Error, Result};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinderConfig {
    /// First port to try.
    #[serde(default = "default_start_port", rename = "startPort")]
    pub start_port: u16,

    /// How many busy ports to step over before giving up.
    #[serde(default = "default_max_attempts", rename = "maxAttempts")]
    pub max_attempts: u32,

    /// Wall-clock budget for the whole search, in milliseconds.
    #[serde(default = "default_timeout_ms", rename = "timeoutMs")]
    pub timeout_ms: u64,

    /// Loopback address to probe.
    #[serde(default = "default_address")]
    pub address: IpAddr,
}

fn default_start_port() -> u16 {
    7000
}

fn default_max_attempts() -> u32 {
    100
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_address() -> IpAddr {
    DEFAULT_ADDRESS
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            start_port: default_start_port(),
            max_attempts: default_max_attempts(),
            timeout_ms: default_timeout_ms(),
            address: default_address(),
        }
    }
}

impl FinderConfig {
    /// Build a validated probe request from these settings.
    pub fn to_request(&self) -> Result<ProbeRequest> {
        ProbeRequest::new(self.start_port, self.max_attempts, self.timeout_ms)?
            .with_address(self.address)
    }

    /// Check that the settings would produce a valid request.
    pub fn validate(&self) -> Result<()> {
        self.to_request()
            .map(|_| ())
            .map_err(|e| Error::Config(e.to_string()))
    }
}

/// Configuration store for search defaults.
///
/// Handles reading and writing configuration to `~/.portfinder/config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portfinder/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".portfinder").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<FinderConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Ok(FinderConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist. Invalid settings
    /// are rejected before anything is written.
    pub async fn save(&self, config: &FinderConfig) -> Result<()> {
        config.validate()?;

        if let Some(config_dir) = self.config_path.parent() {
            fs::create_dir_all(config_dir)
                .await
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(config)?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }

    /// Load, modify and save the configuration.
    pub async fn update<F>(&self, f: F) -> Result<FinderConfig>
    where
        F: FnOnce(&mut FinderConfig),
    {
        let mut config = self.load().await?;
        f(&mut config);
        self.save(&config).await?;
        Ok(config)
    }

    /// Overwrite the file with default settings.
    pub async fn reset(&self) -> Result<FinderConfig> {
        let config = FinderConfig::default();
        self.save(&config).await?;
        Ok(config)
    }
}
