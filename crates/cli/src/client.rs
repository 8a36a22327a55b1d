//! API client for the NURD query API

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// API client for the NURD query API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    async fn send(&self, path: &str) -> Result<Response> {
        let url = self.base_url.join(path).context("Invalid path")?;

        self.client
            .get(url)
            .send()
            .await
            .context("Failed to send request")
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(path).await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Stored snapshots, optionally restricted to one namespace
    pub async fn jobs(&self, namespace: Option<&str>) -> Result<Vec<StoredSnapshot>> {
        match namespace {
            Some(ns) => self.get(&format!("v1/jobs?namespace={}", ns)).await,
            None => self.get("v1/jobs").await,
        }
    }

    /// Snapshot history of one job
    pub async fn job(&self, job_id: &str) -> Result<Vec<StoredSnapshot>> {
        self.get(&format!("v1/job/{}", job_id)).await
    }

    /// Health report. An unhealthy daemon answers 503 with the full report.
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.send("healthz").await?;
        let status = response.status();

        if !status.is_success() && status != StatusCode::SERVICE_UNAVAILABLE {
            return Err(api_error(response).await);
        }

        response
            .json()
            .await
            .context("Failed to parse health response")
    }
}

async fn api_error(response: Response) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    anyhow::anyhow!("API error ({}): {}", status, message)
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub id: i64,
    pub job_id: String,
    pub used_cpu_ticks: f64,
    pub used_rss_mb: f64,
    pub requested_cpu: f64,
    pub requested_memory_mb: f64,
    pub requested_disk_mb: f64,
    pub requested_iops: f64,
    pub namespace: String,
    pub datacenters: String,
    pub captured_at: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub used_cache_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(rename = "Error")]
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub completed_at: i64,
    pub duration_ms: u64,
    pub clusters: usize,
    pub snapshots_persisted: usize,
    pub failed_clusters: usize,
    pub failed_jobs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, ComponentHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle: Option<CycleSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: &str = r#"[
        {"id": 1, "job_id": "web", "used_cpu_ticks": 100.0, "used_rss_mb": 12.5,
         "requested_cpu": 500.0, "requested_memory_mb": 256.0, "requested_disk_mb": 300.0,
         "requested_iops": 0.0, "namespace": "prod", "datacenters": "dc1 dc2",
         "captured_at": "2024-03-01 12:00:00", "name": "web", "used_cache_mb": 4.0}
    ]"#;

    #[tokio::test]
    async fn test_jobs() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/jobs")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ROWS)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let rows = client.jobs(None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].datacenters, "dc1 dc2");
        assert_eq!(rows[0].name, "web");
        assert_eq!(rows[0].used_cache_mb, 4.0);
    }

    #[tokio::test]
    async fn test_jobs_with_namespace() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/jobs")
            .match_query(mockito::Matcher::UrlEncoded(
                "namespace".into(),
                "prod".into(),
            ))
            .with_status(200)
            .with_body(ROWS)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        client.jobs(Some("prod")).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/job/missing")
            .with_status(404)
            .with_body(r#"{"Error": "No snapshots found for job missing"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.job("missing").await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("No snapshots found for job missing"));
    }

    #[tokio::test]
    async fn test_unhealthy_report_is_decoded() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/healthz")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status": "unhealthy", "components": {
                    "store": {"status": "unhealthy", "message": "disk full", "last_check_timestamp": 1}
                }}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let health = client.health().await.unwrap();

        assert_eq!(health.status, "unhealthy");
        assert_eq!(
            health.components["store"].message.as_deref(),
            Some("disk full")
        );
        assert!(health.last_cycle.is_none());
    }

    #[tokio::test]
    async fn test_health_other_errors_still_fail() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/healthz")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.health().await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
