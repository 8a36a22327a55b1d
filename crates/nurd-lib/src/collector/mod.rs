//! Collection of job snapshots from cluster schedulers
//!
//! A [`ClusterCollector`] turns one cluster's job listing into snapshots,
//! a [`CycleCoordinator`] fans collectors out over every configured cluster
//! and persists the merged result, and a [`CollectionLoop`] repeats cycles
//! on the poll interval.

mod cluster;
mod cycle;
mod r#loop;


pub use cluster::{ClusterCollector, ClusterReport, JobFailure};
pub use cycle::{ClusterFailure, CollectedCycle, CycleCoordinator, CycleReport};
pub use r#loop::{CollectionConfig, CollectionLoop, CollectionLoopBuilder};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How failures inside a cycle are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abandon the whole cycle on the first failure and persist nothing
    #[default]
    Abort,
    /// Record failed jobs and clusters, persist everything that succeeded
    Isolate,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Isolate => f.write_str("isolate"),
            FailurePolicy::Abort => f.write_str("abort"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "isolate" => Ok(FailurePolicy::Isolate),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(format!("unknown failure policy {:?}", other)),
        }
    }
}
