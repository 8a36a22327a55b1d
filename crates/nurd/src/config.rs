//! Collector configuration

use anyhow::{Context, Result};
use nurd_lib::FailurePolicy;
use serde::Deserialize;
use std::time::Duration;

/// Collector configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NurdConfig {
    /// Scheduler API addresses (host:port), one per monitored cluster
    #[serde(default)]
    pub clusters: Vec<String>,

    /// Sleep between collection cycles in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-request deadline for scheduler API calls in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Deadline for polling all clusters in one cycle, unbounded when unset
    #[serde(default)]
    pub cycle_timeout_secs: Option<u64>,

    /// Port for the query, health and metrics API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Path of the snapshot store
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// `abort` (default) fails the whole cycle on any error, `isolate`
    /// persists whatever succeeded
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_poll_interval() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    30
}

fn default_api_port() -> u16 {
    8080
}

fn default_store_path() -> String {
    "resources.jsonl".to_string()
}

impl NurdConfig {
    /// Load configuration from the optional config file and `NURD_*`
    /// environment variables, the latter taking precedence
    pub fn load() -> Result<Self> {
        let file = std::env::var("NURD_CONFIG_FILE").unwrap_or_else(|_| "nurd.toml".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix("NURD")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("clusters"),
            )
            .build()
            .context("Failed to read configuration")?;

        let config: NurdConfig = config
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.clusters.is_empty() {
            anyhow::bail!("No cluster addresses configured (set NURD_CLUSTERS=host:port,...)");
        }
        if let Some(address) = self.clusters.iter().find(|a| a.contains("://")) {
            anyhow::bail!("Cluster address {:?} must be host:port without a scheme", address);
        }
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cycle_timeout(&self) -> Option<Duration> {
        self.cycle_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<NurdConfig> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    #[test]
    fn test_defaults() {
        let config = parse(r#"clusters = ["10.0.0.1:4646"]"#).unwrap();

        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.cycle_timeout(), None);
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.store_path, "resources.jsonl");
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            r#"
            clusters = ["10.0.0.1:4646", "10.0.0.2:4646"]
            poll_interval_secs = 120
            cycle_timeout_secs = 90
            failure_policy = "isolate"
            "#,
        )
        .unwrap();

        assert_eq!(config.clusters.len(), 2);
        assert_eq!(config.poll_interval(), Duration::from_secs(120));
        assert_eq!(config.cycle_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
    }

    #[test]
    fn test_validate_rejects_bad_clusters() {
        let empty = parse("poll_interval_secs = 10").unwrap();
        assert!(empty.validate().is_err());

        let scheme = parse(r#"clusters = ["http://10.0.0.1:4646"]"#).unwrap();
        assert!(scheme.validate().is_err());
    }
}
