//! Cluster scheduler API access
//!
//! Requests are plain GETs against a fixed set of endpoints on one
//! cluster's HTTP API. The transport is abstracted behind [`SchedulerApi`]
//! so collectors can be driven by canned payloads in tests.

mod client;
mod types;

pub use client::{ClientConfig, HttpSchedulerClient};
pub use types::{
    AllocResourceUsage, AllocationStub, CpuStats, Job, JobListStub, JobSummary, MemoryStats,
    Resources, ResourceUsage, Task, TaskGroup,
};

use crate::error::SchedulerError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;

/// Client status of allocations that are skipped during usage aggregation
pub const LOST_CLIENT_STATUS: &str = "lost";

/// Scheduler API endpoints polled by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// `/v1/jobs`
    Jobs,
    /// `/v1/job/{id}`
    Job(&'a str),
    /// `/v1/job/{id}/allocations`
    JobAllocations(&'a str),
    /// `/v1/client/allocation/{id}/stats`
    AllocationStats(&'a str),
}

impl Endpoint<'_> {
    /// Request path relative to the cluster address
    pub fn path(&self) -> String {
        match self {
            Endpoint::Jobs => "/v1/jobs".to_string(),
            Endpoint::Job(id) => format!("/v1/job/{}", id),
            Endpoint::JobAllocations(id) => format!("/v1/job/{}/allocations", id),
            Endpoint::AllocationStats(id) => format!("/v1/client/allocation/{}/stats", id),
        }
    }
}

impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Raw access to a cluster scheduler's HTTP API
#[async_trait]
pub trait SchedulerApi: Send + Sync {
    /// Issue a GET for `endpoint` on the cluster at `address` (host:port)
    /// and return the response body
    async fn get(&self, address: &str, endpoint: Endpoint<'_>) -> Result<Vec<u8>, SchedulerError>;
}

/// Fetch an endpoint and decode its body into the typed schema `T`
pub async fn fetch_json<T: DeserializeOwned>(
    api: &dyn SchedulerApi,
    address: &str,
    endpoint: Endpoint<'_>,
) -> Result<T, SchedulerError> {
    let body = api.get(address, endpoint).await?;
    decode(endpoint, &body)
}

pub(crate) fn decode<T: DeserializeOwned>(
    endpoint: Endpoint<'_>,
    body: &[u8],
) -> Result<T, SchedulerError> {
    serde_json::from_slice(body).map_err(|source| SchedulerError::Decode {
        endpoint: endpoint.path(),
        source,
    })
}
