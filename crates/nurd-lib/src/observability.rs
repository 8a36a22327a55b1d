//! Observability infrastructure for the collector
//!
//! Provides:
//! - Prometheus metrics (cycle latency, persisted snapshots, failures)
//! - Structured JSON logging with tracing

use crate::collector::CycleReport;
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for cycle duration (in seconds)
const CYCLE_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<NurdMetricsInner> = OnceLock::new();

struct NurdMetricsInner {
    cycle_duration_seconds: Histogram,
    clusters_configured: IntGauge,
    jobs_last_cycle: IntGauge,
    snapshots_persisted: IntCounter,
    cluster_failures: IntCounter,
    job_failures: IntCounter,
    cycle_errors: IntCounter,
}

impl NurdMetricsInner {
    fn new() -> Self {
        Self {
            cycle_duration_seconds: register_histogram!(
                "nurd_cycle_duration_seconds",
                "Time spent polling all clusters in one collection cycle",
                CYCLE_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_duration_seconds"),

            clusters_configured: register_int_gauge!(
                "nurd_clusters_configured",
                "Number of cluster addresses polled each cycle"
            )
            .expect("Failed to register clusters_configured"),

            jobs_last_cycle: register_int_gauge!(
                "nurd_jobs_last_cycle",
                "Number of job snapshots persisted by the last cycle"
            )
            .expect("Failed to register jobs_last_cycle"),

            snapshots_persisted: register_int_counter!(
                "nurd_snapshots_persisted_total",
                "Total number of job snapshots appended to the store"
            )
            .expect("Failed to register snapshots_persisted"),

            cluster_failures: register_int_counter!(
                "nurd_cluster_failures_total",
                "Total number of cluster collections that failed"
            )
            .expect("Failed to register cluster_failures"),

            job_failures: register_int_counter!(
                "nurd_job_failures_total",
                "Total number of job collections that failed"
            )
            .expect("Failed to register job_failures"),

            cycle_errors: register_int_counter!(
                "nurd_cycle_errors_total",
                "Total number of collection cycles abandoned without persisting"
            )
            .expect("Failed to register cycle_errors"),
        }
    }
}

/// Handle to the process-wide Prometheus metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct NurdMetrics {
    _private: (),
}

impl Default for NurdMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl NurdMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(NurdMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &NurdMetricsInner {
        GLOBAL_METRICS.get_or_init(NurdMetricsInner::new)
    }

    pub fn set_clusters_configured(&self, count: usize) {
        self.inner().clusters_configured.set(count as i64);
    }

    /// Record the outcome of a completed cycle
    pub fn observe_cycle(&self, report: &CycleReport) {
        let inner = self.inner();
        inner
            .cycle_duration_seconds
            .observe(report.collection_elapsed.as_secs_f64());
        inner.jobs_last_cycle.set(report.snapshots_persisted as i64);
        inner
            .snapshots_persisted
            .inc_by(report.snapshots_persisted as u64);
        inner
            .cluster_failures
            .inc_by(report.failed_clusters.len() as u64);
        inner.job_failures.inc_by(report.failed_jobs.len() as u64);
    }

    pub fn inc_cycle_errors(&self) {
        self.inner().cycle_errors.inc();
    }
}

/// Structured logger for collector lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, clusters: &[String], poll_interval_secs: u64) {
        info!(
            event = "collector_started",
            instance = %self.instance,
            version = %version,
            clusters = ?clusters,
            poll_interval_secs = poll_interval_secs,
            "NURD collector started"
        );
    }

    pub fn log_cycle(&self, report: &CycleReport) {
        for failure in &report.failed_clusters {
            warn!(
                event = "cluster_failed",
                instance = %self.instance,
                cluster = %failure.address,
                reason = %failure.reason,
                "Cluster produced no snapshots this cycle"
            );
        }

        for failure in &report.failed_jobs {
            warn!(
                event = "job_failed",
                instance = %self.instance,
                cluster = %failure.cluster,
                job_id = %failure.job_id,
                reason = %failure.reason,
                "Job produced no snapshot this cycle"
            );
        }

        info!(
            event = "cycle_completed",
            instance = %self.instance,
            clusters = report.clusters,
            snapshots = report.snapshots_persisted,
            rows = report.rows_stored,
            failed_clusters = report.failed_clusters.len(),
            failed_jobs = report.failed_jobs.len(),
            elapsed_ms = report.collection_elapsed.as_millis() as u64,
            "Collection cycle complete"
        );
    }

    pub fn log_cycle_error(&self, error: &crate::error::CycleError) {
        error!(
            event = "cycle_aborted",
            instance = %self.instance,
            error = %error,
            "Collection cycle aborted"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "collector_shutdown",
            instance = %self.instance,
            reason = %reason,
            "NURD collector shutting down"
        );
    }
}
