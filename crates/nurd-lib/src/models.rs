//! Core data models for job resource snapshots

use serde::{Deserialize, Serialize};

/// Format used for snapshot capture timestamps (second precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Aggregated resource record for one job captured during one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: String,
    /// Cumulative CPU ticks across all non-lost allocations
    pub used_cpu_ticks: f64,
    /// Normalized resident memory across all non-lost allocations
    pub used_rss_mb: f64,
    pub requested_cpu: f64,
    pub requested_memory_mb: f64,
    pub requested_disk_mb: f64,
    pub requested_iops: f64,
    pub namespace: String,
    /// Datacenter names joined with a single space
    pub datacenters: String,
    pub captured_at: String,
    /// Job name as listed by the scheduler
    #[serde(default)]
    pub name: String,
    /// Normalized page cache across all non-lost allocations
    #[serde(default)]
    pub used_cache_mb: f64,
}

/// A snapshot as recorded by a store, with its permanent row id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub id: i64,
    #[serde(flatten)]
    pub snapshot: JobSnapshot,
}

/// Join datacenter names with a single space, keeping their order
pub fn join_datacenters(datacenters: &[String]) -> String {
    datacenters.join(" ")
}

/// Current local wall-clock time in snapshot timestamp format
pub fn capture_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
