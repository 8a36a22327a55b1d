//! Snapshot collection for a single cluster

use super::FailurePolicy;
use crate::aggregate::{aggregate_requests, aggregate_usage};
use crate::error::SchedulerError;
use crate::models::{capture_timestamp, join_datacenters, JobSnapshot};
use crate::scheduler::{fetch_json, Endpoint, JobListStub, SchedulerApi};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// A job whose snapshot could not be built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFailure {
    pub cluster: String,
    pub job_id: String,
    pub reason: String,
}

/// Output of collecting one cluster
#[derive(Debug, Clone, Default)]
pub struct ClusterReport {
    pub address: String,
    /// Snapshots in the order the scheduler listed the jobs
    pub snapshots: Vec<JobSnapshot>,
    pub failed_jobs: Vec<JobFailure>,
}

/// Builds one snapshot per job listed by a cluster's scheduler
pub struct ClusterCollector {
    api: Arc<dyn SchedulerApi>,
    policy: FailurePolicy,
}

impl ClusterCollector {
    pub fn new(api: Arc<dyn SchedulerApi>, policy: FailurePolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Collect snapshots for every job on the cluster at `address`.
    ///
    /// Jobs are processed one at a time in listing order. Failing to list
    /// jobs always fails the cluster; a failing job fails the cluster only
    /// under [`FailurePolicy::Abort`].
    pub async fn collect(&self, address: &str) -> Result<ClusterReport, SchedulerError> {
        let jobs: Vec<JobListStub> = fetch_json(self.api.as_ref(), address, Endpoint::Jobs).await?;
        debug!(cluster = %address, jobs = jobs.len(), "Listed cluster jobs");

        let mut report = ClusterReport {
            address: address.to_string(),
            snapshots: Vec::with_capacity(jobs.len()),
            failed_jobs: Vec::new(),
        };

        for stub in &jobs {
            match self.collect_job(address, stub).await {
                Ok(snapshot) => report.snapshots.push(snapshot),
                Err(e) if self.policy == FailurePolicy::Isolate => {
                    warn!(
                        cluster = %address,
                        job_id = %stub.job_summary.job_id,
                        error = %e,
                        "Failed to collect job, skipping"
                    );
                    report.failed_jobs.push(JobFailure {
                        cluster: address.to_string(),
                        job_id: stub.job_summary.job_id.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Build the snapshot for one listed job. Usage is aggregated before
    /// requests, never concurrently.
    pub async fn collect_job(
        &self,
        address: &str,
        stub: &JobListStub,
    ) -> Result<JobSnapshot, SchedulerError> {
        let job_id = &stub.job_summary.job_id;

        let usage = aggregate_usage(self.api.as_ref(), address, job_id).await?;
        let requests = aggregate_requests(self.api.as_ref(), address, job_id).await?;

        Ok(JobSnapshot {
            job_id: job_id.clone(),
            used_cpu_ticks: usage.cpu_ticks,
            used_rss_mb: usage.rss,
            requested_cpu: requests.cpu,
            requested_memory_mb: requests.memory_mb,
            requested_disk_mb: requests.disk_mb,
            requested_iops: requests.iops,
            namespace: stub.job_summary.namespace.clone(),
            datacenters: join_datacenters(&stub.datacenters),
            captured_at: capture_timestamp(),
            name: stub.name.clone(),
            used_cache_mb: usage.cache,
        })
    }
}
