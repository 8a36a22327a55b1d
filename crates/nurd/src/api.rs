//! Read-only HTTP API over stored snapshots, plus health and metrics

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use nurd_lib::{
    health::HealthRegistry,
    store::SnapshotStore,
    StoredSnapshot,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const WELCOME: &str = "Welcome to NURD.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SnapshotStore>,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(store: Arc<dyn SnapshotStore>, health_registry: HealthRegistry) -> Self {
        Self {
            store,
            health_registry,
        }
    }
}

/// Error body returned by the query endpoints
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiError {
    #[serde(rename = "Error")]
    pub error: String,
}

fn api_error(status: StatusCode, error: String) -> Response {
    (status, Json(ApiError { error })).into_response()
}

#[derive(Debug, Deserialize)]
struct JobsQuery {
    namespace: Option<String>,
}

async fn home() -> &'static str {
    WELCOME
}

async fn all_rows(state: &AppState) -> Result<Vec<StoredSnapshot>, Response> {
    state.store.read_all().await.map_err(|e| {
        warn!(error = %e, "Failed to read snapshot store");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error in getting all rows from DB: {:#}", e),
        )
    })
}

/// All stored rows, optionally filtered by namespace
async fn list_jobs(State(state): State<Arc<AppState>>, Query(query): Query<JobsQuery>) -> Response {
    match all_rows(&state).await {
        Ok(rows) => {
            let rows: Vec<StoredSnapshot> = match query.namespace {
                Some(ns) => rows
                    .into_iter()
                    .filter(|r| r.snapshot.namespace == ns)
                    .collect(),
                None => rows,
            };
            Json(rows).into_response()
        }
        Err(response) => response,
    }
}

/// Snapshot history of one job
async fn job_history(State(state): State<Arc<AppState>>, Path(job_id): Path<String>) -> Response {
    match all_rows(&state).await {
        Ok(rows) => {
            let rows: Vec<StoredSnapshot> = rows
                .into_iter()
                .filter(|r| r.snapshot.job_id == job_id)
                .collect();
            if rows.is_empty() {
                api_error(
                    StatusCode::NOT_FOUND,
                    format!("No snapshots found for job {}", job_id),
                )
            } else {
                Json(rows).into_response()
            }
        }
        Err(response) => response,
    }
}

/// Health check response - returns 200 unless a component is unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = if health.status == nurd_lib::ComponentStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 once a cycle has completed
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/v1/jobs", get(list_jobs))
        .route("/v1/job/:job_id", get(job_history))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use nurd_lib::collector::CycleReport;
    use nurd_lib::store::MemoryStore;
    use nurd_lib::JobSnapshot;
    use tower::ServiceExt;

    /// Store whose reads always fail
    struct FailingStore;

    #[async_trait]
    impl SnapshotStore for FailingStore {
        async fn append(&self, _snapshot: &JobSnapshot) -> anyhow::Result<StoredSnapshot> {
            anyhow::bail!("Nil pointer parameter")
        }

        async fn read_all(&self) -> anyhow::Result<Vec<StoredSnapshot>> {
            anyhow::bail!("Nil pointer parameter")
        }
    }

    fn snapshot(job_id: &str, namespace: &str) -> JobSnapshot {
        JobSnapshot {
            job_id: job_id.to_string(),
            used_cpu_ticks: 42.0,
            used_rss_mb: 12.5,
            requested_cpu: 500.0,
            requested_memory_mb: 256.0,
            requested_disk_mb: 300.0,
            requested_iops: 0.0,
            namespace: namespace.to_string(),
            datacenters: "dc1".to_string(),
            captured_at: "2024-03-01 12:00:00".to_string(),
            name: job_id.to_string(),
            used_cache_mb: 16.0,
        }
    }

    async fn setup_test_app() -> (Router, Arc<AppState>) {
        let store = Arc::new(MemoryStore::new());
        store.append(&snapshot("web", "prod")).await.unwrap();
        store.append(&snapshot("batch", "default")).await.unwrap();
        store.append(&snapshot("web", "prod")).await.unwrap();

        let state = Arc::new(AppState::new(store, HealthRegistry::new()));
        (create_router(state.clone()), state)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_home_page() {
        let (app, _state) = setup_test_app().await;
        let (status, body) = get(app, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(body).unwrap(), "Welcome to NURD.");
    }

    #[tokio::test]
    async fn test_list_jobs_returns_all_rows() {
        let (app, _state) = setup_test_app().await;
        let (status, body) = get(app, "/v1/jobs").await;

        assert_eq!(status, StatusCode::OK);
        let rows: Vec<StoredSnapshot> = serde_json::from_slice(&body).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].snapshot.job_id, "batch");
    }

    #[tokio::test]
    async fn test_list_jobs_includes_name_and_cache() {
        let (app, _state) = setup_test_app().await;
        let (_, body) = get(app, "/v1/jobs").await;

        let rows: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(rows[0]["name"], "web");
        assert_eq!(rows[0]["used_cache_mb"], 16.0);
    }

    #[tokio::test]
    async fn test_list_jobs_is_idempotent() {
        let (app, _state) = setup_test_app().await;
        let (_, first) = get(app.clone(), "/v1/jobs").await;
        let (_, second) = get(app, "/v1/jobs").await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_jobs_filters_namespace() {
        let (app, _state) = setup_test_app().await;
        let (_, body) = get(app, "/v1/jobs?namespace=prod").await;

        let rows: Vec<StoredSnapshot> = serde_json::from_slice(&body).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.snapshot.namespace == "prod"));
    }

    #[tokio::test]
    async fn test_job_history() {
        let (app, _state) = setup_test_app().await;
        let (status, body) = get(app.clone(), "/v1/job/web").await;

        assert_eq!(status, StatusCode::OK);
        let rows: Vec<StoredSnapshot> = serde_json::from_slice(&body).unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let (status, body) = get(app, "/v1/job/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert!(error.error.contains("missing"));
    }

    #[tokio::test]
    async fn test_list_jobs_store_failure() {
        let state = Arc::new(AppState::new(Arc::new(FailingStore), HealthRegistry::new()));
        let (status, body) = get(create_router(state), "/v1/jobs").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            error,
            ApiError {
                error: "Error in getting all rows from DB: Nil pointer parameter".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_readyz_before_and_after_cycle() {
        let (app, state) = setup_test_app().await;
        let (status, _) = get(app.clone(), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        state
            .health_registry
            .record_cycle(&CycleReport {
                clusters: 1,
                snapshots_persisted: 3,
                ..Default::default()
            })
            .await;

        let (status, _) = get(app.clone(), "/readyz").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get(app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["last_cycle"]["snapshots_persisted"], 3);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        nurd_lib::NurdMetrics::new();
        let (app, _state) = setup_test_app().await;
        let (status, body) = get(app, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("nurd_snapshots_persisted_total"));
    }
}
