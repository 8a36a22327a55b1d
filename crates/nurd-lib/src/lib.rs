//! Core library for the NURD job resource collector
//!
//! This crate provides:
//! - A typed client for cluster scheduler HTTP APIs
//! - Per-job usage and request aggregation
//! - Concurrent collection cycles across many clusters
//! - Append-only snapshot storage
//! - Health checks and observability

pub mod aggregate;
pub mod collector;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod scheduler;
pub mod store;

pub use collector::{CollectionLoop, CollectionLoopBuilder, CycleReport, FailurePolicy};
pub use error::{CycleError, SchedulerError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{NurdMetrics, StructuredLogger};
