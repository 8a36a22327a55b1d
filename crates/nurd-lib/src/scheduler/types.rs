//! Typed schema for the scheduler API responses
//!
//! Resource figures that are absent from a payload decode as zero.
//! Identifiers (`JobID`, `ID`, `ClientStatus`) are required.

use serde::Deserialize;

/// Entry of the `/v1/jobs` listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobListStub {
    #[serde(default)]
    pub name: String,
    pub job_summary: JobSummary,
    #[serde(default)]
    pub datacenters: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobSummary {
    #[serde(rename = "JobID")]
    pub job_id: String,
    #[serde(default)]
    pub namespace: String,
}

/// Job specification returned by `/v1/job/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
    /// `null` and absent both mean no task groups
    #[serde(default)]
    pub task_groups: Option<Vec<TaskGroup>>,
}

impl Job {
    pub fn task_groups(&self) -> &[TaskGroup] {
        self.task_groups.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskGroup {
    /// Replica count
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    #[serde(default)]
    pub resources: Option<Resources>,
}

/// Resources requested by a single task
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Resources {
    #[serde(rename = "CPU", default)]
    pub cpu: f64,
    #[serde(rename = "MemoryMB", default)]
    pub memory_mb: f64,
    #[serde(rename = "DiskMB", default)]
    pub disk_mb: f64,
    #[serde(rename = "IOPS", default)]
    pub iops: f64,
}

/// Entry of the `/v1/job/{id}/allocations` listing
#[derive(Debug, Clone, Deserialize)]
pub struct AllocationStub {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "ClientStatus")]
    pub client_status: String,
}

/// Payload of `/v1/client/allocation/{id}/stats`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllocResourceUsage {
    #[serde(default)]
    pub resource_usage: Option<ResourceUsage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceUsage {
    #[serde(default)]
    pub memory_stats: MemoryStats,
    #[serde(default)]
    pub cpu_stats: CpuStats,
}

/// Memory figures in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemoryStats {
    #[serde(rename = "RSS", default)]
    pub rss: f64,
    #[serde(default)]
    pub cache: f64,
    #[serde(default)]
    pub swap: f64,
    #[serde(default)]
    pub usage: f64,
    #[serde(default)]
    pub max_usage: f64,
    #[serde(default)]
    pub kernel_usage: f64,
    #[serde(default)]
    pub kernel_max_usage: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CpuStats {
    #[serde(default)]
    pub total_ticks: f64,
}
