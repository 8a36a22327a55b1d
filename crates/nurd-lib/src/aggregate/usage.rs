//! Observed usage aggregation across a job's allocations

use crate::error::SchedulerError;
use crate::scheduler::{
    fetch_json, AllocResourceUsage, AllocationStub, Endpoint, MemoryStats, ResourceUsage,
    SchedulerApi, LOST_CLIENT_STATUS,
};
use tracing::debug;

/// Divisor applied to every memory figure reported in bytes.
///
/// Historical snapshots were recorded with this value; it must stay
/// bit-for-bit identical to keep new rows comparable with old ones.
pub const MEMORY_NORMALIZATION_DIVISOR: f64 = 1.049e6;

/// Convert a memory figure in bytes to the unit stored in snapshots
pub fn normalize_memory(bytes: f64) -> f64 {
    bytes / MEMORY_NORMALIZATION_DIVISOR
}

/// Running usage totals for one job
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageTotals {
    pub cpu_ticks: f64,
    pub rss: f64,
    pub cache: f64,
    pub swap: f64,
    pub usage: f64,
    pub max_usage: f64,
    pub kernel_usage: f64,
    pub kernel_max_usage: f64,
    /// Allocations whose stats were folded in
    pub allocations: usize,
}

impl UsageTotals {
    /// Fold one allocation's stats payload into the totals.
    ///
    /// A payload without a usage section contributes nothing.
    pub fn add(&mut self, stats: &AllocResourceUsage) {
        if let Some(usage) = &stats.resource_usage {
            self.add_usage(usage);
        }
    }

    fn add_usage(&mut self, usage: &ResourceUsage) {
        let MemoryStats {
            rss,
            cache,
            swap,
            usage: used,
            max_usage,
            kernel_usage,
            kernel_max_usage,
        } = usage.memory_stats;

        self.rss += normalize_memory(rss);
        self.cache += normalize_memory(cache);
        self.swap += normalize_memory(swap);
        self.usage += normalize_memory(used);
        self.max_usage += normalize_memory(max_usage);
        self.kernel_usage += normalize_memory(kernel_usage);
        self.kernel_max_usage += normalize_memory(kernel_max_usage);
        self.cpu_ticks += usage.cpu_stats.total_ticks;
        self.allocations += 1;
    }
}

/// Whether an allocation's stats should be fetched and counted
pub(crate) fn is_counted(allocation: &AllocationStub) -> bool {
    allocation.client_status != LOST_CLIENT_STATUS
}

/// Sum observed CPU ticks and normalized memory over all non-lost
/// allocations of a job
pub async fn aggregate_usage(
    api: &dyn SchedulerApi,
    address: &str,
    job_id: &str,
) -> Result<UsageTotals, SchedulerError> {
    let allocations: Vec<AllocationStub> =
        fetch_json(api, address, Endpoint::JobAllocations(job_id)).await?;

    let mut totals = UsageTotals::default();

    for allocation in allocations.iter().filter(|a| is_counted(a)) {
        let stats: AllocResourceUsage =
            fetch_json(api, address, Endpoint::AllocationStats(&allocation.id)).await?;
        totals.add(&stats);
    }

    debug!(
        cluster = %address,
        job_id = %job_id,
        allocations = allocations.len(),
        counted = totals.allocations,
        cpu_ticks = totals.cpu_ticks,
        rss = totals.rss,
        cache = totals.cache,
        swap = totals.swap,
        usage = totals.usage,
        max_usage = totals.max_usage,
        kernel_usage = totals.kernel_usage,
        kernel_max_usage = totals.kernel_max_usage,
        "Aggregated job usage"
    );

    Ok(totals)
}
