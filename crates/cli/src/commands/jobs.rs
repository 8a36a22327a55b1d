//! Snapshot query commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, StoredSnapshot};
use crate::output::{format_memory, format_number, print_info, print_table, OutputFormat};

/// Row for the snapshot table
#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Job")]
    job_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "CPU Ticks")]
    used_cpu_ticks: String,
    #[tabled(rename = "CPU Req")]
    requested_cpu: String,
    #[tabled(rename = "RSS")]
    used_rss: String,
    #[tabled(rename = "Cache")]
    used_cache: String,
    #[tabled(rename = "Mem Req")]
    requested_memory: String,
    #[tabled(rename = "Disk Req")]
    requested_disk: String,
    #[tabled(rename = "IOPS Req")]
    requested_iops: String,
    #[tabled(rename = "Datacenters")]
    datacenters: String,
    #[tabled(rename = "Captured")]
    captured_at: String,
}

impl From<&StoredSnapshot> for SnapshotRow {
    fn from(s: &StoredSnapshot) -> Self {
        Self {
            id: s.id,
            job_id: s.job_id.clone(),
            name: s.name.clone(),
            namespace: s.namespace.clone(),
            used_cpu_ticks: format_number(s.used_cpu_ticks),
            requested_cpu: format_number(s.requested_cpu),
            used_rss: format_memory(s.used_rss_mb),
            used_cache: format_memory(s.used_cache_mb),
            requested_memory: format_memory(s.requested_memory_mb),
            requested_disk: format_memory(s.requested_disk_mb),
            requested_iops: format_number(s.requested_iops),
            datacenters: s.datacenters.clone(),
            captured_at: s.captured_at.clone(),
        }
    }
}

fn print_snapshots(snapshots: &[StoredSnapshot], format: OutputFormat) {
    let rows: Vec<SnapshotRow> = snapshots.iter().map(SnapshotRow::from).collect();
    print_table(&rows, snapshots, format);
}

/// List stored snapshots
pub async fn list_jobs(
    client: &ApiClient,
    namespace: Option<String>,
    latest: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut snapshots = client.jobs(namespace.as_deref()).await?;

    if latest {
        snapshots = latest_per_job(snapshots);
    }

    print_snapshots(&snapshots, format);

    if matches!(format, OutputFormat::Table) && !snapshots.is_empty() {
        print_info(&format!("{} snapshot(s)", snapshots.len()));
    }

    Ok(())
}

/// Show the snapshot history of one job
pub async fn show_job(client: &ApiClient, job_id: &str, format: OutputFormat) -> Result<()> {
    let snapshots = client.job(job_id).await?;
    print_snapshots(&snapshots, format);
    Ok(())
}

/// Keep only the most recent snapshot of each job, in first-seen order
fn latest_per_job(snapshots: Vec<StoredSnapshot>) -> Vec<StoredSnapshot> {
    let mut latest: Vec<StoredSnapshot> = Vec::new();

    for snapshot in snapshots {
        match latest.iter_mut().find(|s| s.job_id == snapshot.job_id) {
            Some(existing) if existing.id < snapshot.id => *existing = snapshot,
            Some(_) => {}
            None => latest.push(snapshot),
        }
    }

    latest
}
