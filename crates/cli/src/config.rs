//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default query API endpoint
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// CLI configuration read from `~/.config/nurd/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API endpoint URL
    pub api_url: Option<String>,
    /// Default namespace for `jobs`
    pub default_namespace: Option<String>,
}

impl Config {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        let Some(config_path) = Self::config_path() else {
            return Ok(Self::default());
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {:?}", config_path))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// API URL from the command line or environment, then the config file
    pub fn resolve_api_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("nurd").join("config.json"))
    }
}
