//! Error types for scheduler access and collection cycles

use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to a cluster scheduler API
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Address could not be turned into a request URL
    #[error("invalid scheduler address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Connection refused, reset, or any other transport failure
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Request exceeded its per-call deadline
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// Scheduler answered with a non-success status
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Response body did not match the expected schema
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that end a collection cycle without persisting it
#[derive(Debug, Error)]
pub enum CycleError {
    /// A cluster failed while the abort policy is active
    #[error("cluster {address} failed: {source}")]
    Cluster {
        address: String,
        #[source]
        source: SchedulerError,
    },

    /// A cluster task panicked or was cancelled while the abort policy is active
    #[error("cluster task did not complete: {0}")]
    Task(String),

    /// The cycle deadline elapsed while the abort policy is active
    #[error("collection cycle exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// The snapshot store rejected a write or read
    #[error("snapshot store failure: {0:#}")]
    Store(anyhow::Error),
}
