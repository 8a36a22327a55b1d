//! Collection loop
//!
//! Runs collection cycles back to back, sleeping for the poll interval
//! after each one. A cycle never overlaps with the next.

use super::{ClusterCollector, CycleCoordinator, CycleReport, FailurePolicy};
use crate::error::CycleError;
use crate::health::HealthRegistry;
use crate::observability::{NurdMetrics, StructuredLogger};
use crate::scheduler::SchedulerApi;
use crate::store::SnapshotStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

/// Configuration for the collection loop
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Sleep between the end of one cycle and the start of the next (default: 60 seconds)
    pub poll_interval: Duration,
    /// Deadline for polling all clusters in one cycle (default: none)
    pub cycle_timeout: Option<Duration>,
    pub failure_policy: FailurePolicy,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            cycle_timeout: None,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Periodic driver for collection cycles
pub struct CollectionLoop {
    coordinator: CycleCoordinator,
    config: CollectionConfig,
    health: HealthRegistry,
    metrics: NurdMetrics,
    logger: StructuredLogger,
}

impl CollectionLoop {
    pub fn new(
        coordinator: CycleCoordinator,
        config: CollectionConfig,
        health: HealthRegistry,
    ) -> Self {
        let metrics = NurdMetrics::new();
        metrics.set_clusters_configured(coordinator.addresses().len());

        Self {
            coordinator,
            config,
            health,
            metrics,
            logger: StructuredLogger::new("collector"),
        }
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Run cycles until shutdown is signalled or a cycle is abandoned.
    ///
    /// Shutdown cancels an in-flight cycle as well as the sleep between
    /// cycles. An abandoned cycle is returned as an error.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), CycleError> {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            clusters = self.coordinator.addresses().len(),
            policy = %self.config.failure_policy,
            "Starting collection loop"
        );

        loop {
            let collected = tokio::select! {
                collected = self.coordinator.collect() => collected,
                _ = shutdown.recv() => {
                    info!("Shutting down collection loop, cancelling in-flight cycle");
                    break;
                }
            };

            // Once collected, a cycle is persisted even if shutdown arrives
            let outcome = match collected {
                Ok(collected) => self.coordinator.persist(collected).await,
                Err(e) => Err(e),
            };
            self.record(outcome).await?;

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = shutdown.recv() => {
                    info!("Shutting down collection loop");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run a single cycle and record its outcome
    pub async fn run_once(&self) -> Result<CycleReport, CycleError> {
        let outcome = self.coordinator.run_cycle().await;
        self.record(outcome).await
    }

    async fn record(
        &self,
        outcome: Result<CycleReport, CycleError>,
    ) -> Result<CycleReport, CycleError> {
        match outcome {
            Ok(report) => {
                self.metrics.observe_cycle(&report);
                self.logger.log_cycle(&report);
                self.health.record_cycle(&report).await;
                Ok(report)
            }
            Err(e) => {
                self.metrics.inc_cycle_errors();
                self.logger.log_cycle_error(&e);
                self.health.record_cycle_error(&e).await;
                Err(e)
            }
        }
    }
}

/// Builder for creating the collection loop
pub struct CollectionLoopBuilder {
    scheduler: Option<Arc<dyn SchedulerApi>>,
    store: Option<Arc<dyn SnapshotStore>>,
    clusters: Vec<String>,
    health: Option<HealthRegistry>,
    config: CollectionConfig,
}

impl CollectionLoopBuilder {
    pub fn new() -> Self {
        Self {
            scheduler: None,
            store: None,
            clusters: Vec::new(),
            health: None,
            config: CollectionConfig::default(),
        }
    }

    /// Set the scheduler API client
    pub fn scheduler(mut self, scheduler: Arc<dyn SchedulerApi>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Set the snapshot store
    pub fn store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the cluster addresses (host:port), polled in this order
    pub fn clusters(mut self, clusters: Vec<String>) -> Self {
        self.clusters = clusters;
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn cycle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.cycle_timeout = timeout;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn build(self) -> Result<CollectionLoop> {
        let scheduler = self
            .scheduler
            .ok_or_else(|| anyhow::anyhow!("Scheduler client is required"))?;
        let store = self
            .store
            .ok_or_else(|| anyhow::anyhow!("Snapshot store is required"))?;
        if self.clusters.is_empty() {
            anyhow::bail!("At least one cluster address is required");
        }

        let collector = Arc::new(ClusterCollector::new(
            scheduler,
            self.config.failure_policy,
        ));
        let coordinator = CycleCoordinator::new(collector, store, self.clusters)
            .with_cycle_timeout(self.config.cycle_timeout);

        Ok(CollectionLoop::new(
            coordinator,
            self.config,
            self.health.unwrap_or_default(),
        ))
    }
}

impl Default for CollectionLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
