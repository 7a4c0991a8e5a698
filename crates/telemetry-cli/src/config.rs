//! Configuration file handling for telemetry-cli

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use telemetry_client::ClientConfig;

pub const DEFAULT_SERVER: &str = "http://localhost:8080";

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default server URL
    pub server: Option<String>,
    /// Default user whose vehicles are read
    pub user_id: Option<String>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("telemetry-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        server: Option<&str>,
        user_id: Option<&str>,
        output: Option<&str>,
        no_color: bool,
    ) -> MergedConfig {
        MergedConfig {
            server: server
                .map(String::from)
                .or_else(|| self.server.clone())
                .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            user_id: user_id.map(String::from).or_else(|| self.user_id.clone()),
            output: output
                .map(String::from)
                .or_else(|| self.output.clone())
                .unwrap_or_else(|| "table".to_string()),
            no_color: no_color || self.no_color.unwrap_or(false),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub server: String,
    pub user_id: Option<String>,
    pub output: String,
    pub no_color: bool,
    pub timeout: Option<Duration>,
}

impl MergedConfig {
    /// The user to act for, or an error telling how to set one
    pub fn require_user(&self) -> Result<&str> {
        self.user_id
            .as_deref()
            .context("No user ID given: pass --user, set TELEMETRY_USER, or add user_id to the config file")
    }

    /// Transport settings for the client
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::default()
            .with_user_agent(concat!("telemetry-cli/", env!("CARGO_PKG_VERSION")));
        match self.timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}
