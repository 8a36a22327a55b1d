//! Per-job resource aggregation
//!
//! Two independent passes are made for each job: observed usage summed over
//! its live allocations, and requested resources summed over its task groups.
//! Each pass fetches its own data from the scheduler.

mod request;
mod usage;

pub use request::{aggregate_requests, RequestTotals};
pub use usage::{aggregate_usage, normalize_memory, UsageTotals, MEMORY_NORMALIZATION_DIVISOR};
