//! Health tracking for the collector daemon
//!
//! Component statuses are derived from the outcome of each collection
//! cycle. The daemon reports ready once the first cycle has completed.

use crate::collector::CycleReport;
use crate::error::CycleError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Operational, but some clusters or jobs are failing
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::new(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::new(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::new(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

/// Outcome of the most recent completed cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub completed_at: i64,
    pub duration_ms: u64,
    pub clusters: usize,
    pub snapshots_persisted: usize,
    pub failed_clusters: usize,
    pub failed_jobs: usize,
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle: Option<CycleSummary>,
}

impl HealthResponse {
    /// Worst status among all components
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|c| c.status)
            .max_by_key(|status| match status {
                ComponentStatus::Healthy => 0,
                ComponentStatus::Degraded => 1,
                ComponentStatus::Unhealthy => 2,
            })
            .unwrap_or(ComponentStatus::Healthy)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const COLLECTOR: &str = "collector";
    pub const SCHEDULER_API: &str = "scheduler_api";
    pub const STORE: &str = "store";
}

#[derive(Debug, Default)]
struct HealthState {
    components: HashMap<String, ComponentHealth>,
    last_cycle: Option<CycleSummary>,
}

/// Shared health state, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<HealthState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component with initial healthy status
    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        let mut state = self.state.write().await;
        state.components.insert(name.to_string(), health);
    }

    /// Derive component statuses from a completed cycle
    pub async fn record_cycle(&self, report: &CycleReport) {
        let scheduler = if report.clusters > 0 && report.failed_clusters.len() == report.clusters {
            ComponentHealth::unhealthy("All clusters failed in the last cycle")
        } else if !report.is_clean() {
            ComponentHealth::degraded(format!(
                "{} cluster(s) and {} job(s) failed in the last cycle",
                report.failed_clusters.len(),
                report.failed_jobs.len()
            ))
        } else {
            ComponentHealth::healthy()
        };

        let mut state = self.state.write().await;
        state
            .components
            .insert(components::SCHEDULER_API.to_string(), scheduler);
        state
            .components
            .insert(components::STORE.to_string(), ComponentHealth::healthy());
        state
            .components
            .insert(components::COLLECTOR.to_string(), ComponentHealth::healthy());
        state.last_cycle = Some(CycleSummary {
            completed_at: chrono::Utc::now().timestamp(),
            duration_ms: report.elapsed.as_millis() as u64,
            clusters: report.clusters,
            snapshots_persisted: report.snapshots_persisted,
            failed_clusters: report.failed_clusters.len(),
            failed_jobs: report.failed_jobs.len(),
        });
    }

    /// Mark the failing component after a cycle was abandoned
    pub async fn record_cycle_error(&self, error: &CycleError) {
        let component = match error {
            CycleError::Store(_) => components::STORE,
            _ => components::SCHEDULER_API,
        };

        let mut state = self.state.write().await;
        state.components.insert(
            component.to_string(),
            ComponentHealth::unhealthy(error.to_string()),
        );
        state.components.insert(
            components::COLLECTOR.to_string(),
            ComponentHealth::unhealthy("Collection cycle aborted"),
        );
    }

    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        HealthResponse {
            status: HealthResponse::compute_status(&state.components),
            components: state.components.clone(),
            last_cycle: state.last_cycle.clone(),
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;
        let status = HealthResponse::compute_status(&state.components);

        let reason = if state.last_cycle.is_none() {
            Some("No collection cycle completed yet")
        } else if status == ComponentStatus::Unhealthy {
            Some("Critical component unhealthy")
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason: reason.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{ClusterFailure, JobFailure};

    fn report(clusters: usize, failed_clusters: usize, failed_jobs: usize) -> CycleReport {
        CycleReport {
            clusters,
            snapshots_persisted: 3,
            failed_clusters: (0..failed_clusters)
                .map(|i| ClusterFailure {
                    address: format!("10.0.0.{}:4646", i),
                    reason: "connection refused".to_string(),
                })
                .collect(),
            failed_jobs: (0..failed_jobs)
                .map(|i| JobFailure {
                    cluster: "10.0.0.9:4646".to_string(),
                    job_id: format!("job-{}", i),
                    reason: "decode".to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_initial_state() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
        assert!(health.last_cycle.is_none());
    }

    #[tokio::test]
    async fn test_not_ready_before_first_cycle() {
        let registry = HealthRegistry::new();
        registry.register(components::COLLECTOR).await;

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());
    }

    #[tokio::test]
    async fn test_clean_cycle_is_healthy_and_ready() {
        let registry = HealthRegistry::new();
        registry.record_cycle(&report(2, 0, 0)).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert_eq!(health.last_cycle.unwrap().snapshots_persisted, 3);
        assert!(registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_partial_failure_is_degraded() {
        let registry = HealthRegistry::new();
        registry.record_cycle(&report(2, 1, 2)).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert_eq!(
            health.components[components::SCHEDULER_API].status,
            ComponentStatus::Degraded
        );
        assert!(registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_all_clusters_failed_is_unhealthy() {
        let registry = HealthRegistry::new();
        registry.record_cycle(&report(2, 2, 0)).await;

        assert_eq!(registry.health().await.status, ComponentStatus::Unhealthy);
        assert!(!registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_store_error_marks_store_unhealthy() {
        let registry = HealthRegistry::new();
        registry
            .record_cycle_error(&CycleError::Store(anyhow::anyhow!("disk full")))
            .await;

        let health = registry.health().await;
        assert_eq!(
            health.components[components::STORE].status,
            ComponentStatus::Unhealthy
        );
        assert_eq!(health.status, ComponentStatus::Unhealthy);
    }
}
