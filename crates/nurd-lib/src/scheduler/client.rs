//! reqwest-backed scheduler API client

use super::{Endpoint, SchedulerApi};
use crate::error::SchedulerError;
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error as _;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Configuration for the scheduler HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deadline for a whole request, including reading the body
    pub request_timeout: Duration,
    /// Deadline for establishing the TCP connection
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Scheduler API client speaking plain HTTP to `host:port` addresses
#[derive(Debug, Clone)]
pub struct HttpSchedulerClient {
    client: Client,
    config: ClientConfig,
}

impl HttpSchedulerClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    /// Create a new client with default timeouts
    pub fn with_defaults() -> anyhow::Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the per-request timeout
    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }

    /// Build the request URL for an endpoint on a cluster
    pub fn endpoint_url(address: &str, endpoint: Endpoint<'_>) -> Result<Url, SchedulerError> {
        if address.is_empty() || address.contains("://") {
            return Err(SchedulerError::InvalidAddress {
                address: address.to_string(),
                reason: "expected host:port without a scheme".to_string(),
            });
        }

        let url = Url::parse(&format!("http://{}{}", address, endpoint.path())).map_err(|e| {
            SchedulerError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(url)
    }

    fn classify(&self, url: &Url, error: reqwest::Error) -> SchedulerError {
        if error.is_timeout() {
            return SchedulerError::Timeout {
                url: url.to_string(),
                timeout: self.config.request_timeout,
            };
        }

        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        SchedulerError::Transport {
            url: url.to_string(),
            message,
        }
    }
}

#[async_trait]
impl SchedulerApi for HttpSchedulerClient {
    async fn get(&self, address: &str, endpoint: Endpoint<'_>) -> Result<Vec<u8>, SchedulerError> {
        let url = Self::endpoint_url(address, endpoint)?;
        debug!(url = %url, "Querying scheduler API");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SchedulerError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(&url, e))?;
        Ok(body.to_vec())
    }
}
