//! One collection cycle across all configured clusters

use super::{ClusterCollector, ClusterReport, FailurePolicy, JobFailure};
use crate::error::CycleError;
use crate::models::JobSnapshot;
use crate::store::SnapshotStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A cluster that produced no snapshots in a cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterFailure {
    pub address: String,
    pub reason: String,
}

/// Summary of a completed cycle
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub clusters: usize,
    pub snapshots_persisted: usize,
    pub failed_clusters: Vec<ClusterFailure>,
    pub failed_jobs: Vec<JobFailure>,
    /// Rows in the store after persistence
    pub rows_stored: usize,
    /// Time spent polling clusters, excluding persistence
    pub collection_elapsed: Duration,
    pub elapsed: Duration,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.failed_clusters.is_empty() && self.failed_jobs.is_empty()
    }
}

type ClusterOutcome = Result<ClusterReport, String>;

/// Snapshots merged from every cluster, not yet persisted
#[derive(Debug)]
pub struct CollectedCycle {
    pub snapshots: Vec<JobSnapshot>,
    pub report: CycleReport,
    start: Instant,
}

/// Runs collection cycles: fan out, join, merge, persist
pub struct CycleCoordinator {
    collector: Arc<ClusterCollector>,
    store: Arc<dyn SnapshotStore>,
    addresses: Vec<String>,
    cycle_timeout: Option<Duration>,
}

impl CycleCoordinator {
    pub fn new(
        collector: Arc<ClusterCollector>,
        store: Arc<dyn SnapshotStore>,
        addresses: Vec<String>,
    ) -> Self {
        Self {
            collector,
            store,
            addresses,
            cycle_timeout: None,
        }
    }

    /// Cancel clusters that have not finished within `timeout`
    pub fn with_cycle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.cycle_timeout = timeout;
        self
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    fn policy(&self) -> FailurePolicy {
        self.collector.policy()
    }

    /// Run exactly one cycle: collect every cluster, then persist.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let collected = self.collect().await?;
        self.persist(collected).await
    }

    /// Poll every cluster and merge the snapshots in cluster configuration
    /// order and, within a cluster, listing order. Nothing is written, so
    /// dropping this future leaves the store untouched.
    pub async fn collect(&self) -> Result<CollectedCycle, CycleError> {
        let start = Instant::now();
        let outcomes = self.collect_clusters().await?;

        let mut report = CycleReport {
            clusters: self.addresses.len(),
            ..Default::default()
        };
        let mut snapshots: Vec<JobSnapshot> = Vec::new();

        for (address, outcome) in self.addresses.iter().zip(outcomes) {
            match outcome {
                Ok(cluster) => {
                    report.failed_jobs.extend(cluster.failed_jobs);
                    snapshots.extend(cluster.snapshots);
                }
                Err(reason) => report.failed_clusters.push(ClusterFailure {
                    address: address.clone(),
                    reason,
                }),
            }
        }

        report.collection_elapsed = start.elapsed();
        Ok(CollectedCycle {
            snapshots,
            report,
            start,
        })
    }

    /// Append a collected cycle to the store, one row per snapshot in order
    pub async fn persist(&self, collected: CollectedCycle) -> Result<CycleReport, CycleError> {
        let CollectedCycle {
            snapshots,
            mut report,
            start,
        } = collected;

        for snapshot in &snapshots {
            self.store.append(snapshot).await.map_err(CycleError::Store)?;
            report.snapshots_persisted += 1;
        }

        let rows = self.store.read_all().await.map_err(CycleError::Store)?;
        for row in &rows {
            debug!(
                id = row.id,
                job_id = %row.snapshot.job_id,
                name = %row.snapshot.name,
                used_cpu_ticks = row.snapshot.used_cpu_ticks,
                requested_cpu = row.snapshot.requested_cpu,
                used_rss_mb = row.snapshot.used_rss_mb,
                used_cache_mb = row.snapshot.used_cache_mb,
                requested_memory_mb = row.snapshot.requested_memory_mb,
                requested_disk_mb = row.snapshot.requested_disk_mb,
                requested_iops = row.snapshot.requested_iops,
                namespace = %row.snapshot.namespace,
                datacenters = %row.snapshot.datacenters,
                captured_at = %row.snapshot.captured_at,
                "Stored snapshot"
            );
        }

        report.rows_stored = rows.len();
        report.elapsed = start.elapsed();
        debug!(
            persisted = report.snapshots_persisted,
            rows = report.rows_stored,
            "Cycle persisted"
        );

        Ok(report)
    }

    /// Launch one task per cluster and wait for all of them, or for the
    /// cycle deadline. Outcomes are returned in configuration order.
    async fn collect_clusters(&self) -> Result<Vec<ClusterOutcome>, CycleError> {
        let policy = self.policy();
        let mut tasks = JoinSet::new();

        for (index, address) in self.addresses.iter().enumerate() {
            let collector = Arc::clone(&self.collector);
            let address = address.clone();
            tasks.spawn(async move {
                let result = collector.collect(&address).await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<ClusterOutcome>> = vec![None; self.addresses.len()];
        let deadline = self.cycle_timeout.map(|t| Instant::now() + t);
        let mut timed_out = false;

        loop {
            let joined = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        timed_out = true;
                        break;
                    }
                },
                None => tasks.join_next().await,
            };
            let Some(joined) = joined else { break };

            match joined {
                Ok((index, Ok(report))) => slots[index] = Some(Ok(report)),
                Ok((index, Err(e))) => {
                    let address = &self.addresses[index];
                    if policy == FailurePolicy::Abort {
                        return Err(CycleError::Cluster {
                            address: address.clone(),
                            source: e,
                        });
                    }
                    warn!(cluster = %address, error = %e, "Cluster collection failed");
                    slots[index] = Some(Err(e.to_string()));
                }
                Err(e) => {
                    if policy == FailurePolicy::Abort {
                        return Err(CycleError::Task(e.to_string()));
                    }
                    warn!(error = %e, "Cluster task did not complete");
                }
            }
        }

        if timed_out {
            tasks.abort_all();
            if let (FailurePolicy::Abort, Some(timeout)) = (policy, self.cycle_timeout) {
                return Err(CycleError::DeadlineExceeded(timeout));
            }
        }

        let missing_reason = if timed_out {
            "cycle deadline exceeded"
        } else {
            "cluster task panicked"
        };

        Ok(slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(missing_reason.to_string())))
            .collect())
    }
}
