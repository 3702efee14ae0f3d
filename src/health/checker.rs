// src/health/checker.rs
use crate::config::{endpoint_url, HealthCheckConfig, ServiceConfig};
use crate::health::{ServiceHealthResult, StatusSummary};
use crate::metrics::MetricsCollector;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

pub struct HealthChecker {
    config: HealthCheckConfig,
    client: Client,
    metrics: Option<Arc<MetricsCollector>>,
}

/// A health result labelled with the service it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceReport {
    pub id: String,
    pub name: String,
    pub result: ServiceHealthResult,
}

impl HealthChecker {
    pub fn new(
        config: HealthCheckConfig,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Result<Self> {
        // No idle pooling: each check opens its own connection.
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(0)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            client,
            metrics,
        })
    }

    /// Polls `{base_url}{path}` once. Every failure mode, including a
    /// timeout, becomes [`ServiceHealthResult::Unhealthy`].
    pub async fn check_service_health(
        &self,
        base_url: &Url,
        service_name: &str,
    ) -> ServiceHealthResult {
        self.check_labelled(base_url, service_name, service_name).await
    }

    /// `metric_label` keys the prometheus series, `service_name` the logs.
    async fn check_labelled(
        &self,
        base_url: &Url,
        metric_label: &str,
        service_name: &str,
    ) -> ServiceHealthResult {
        let start = std::time::Instant::now();
        let endpoint = endpoint_url(base_url, &self.config.path);

        let result = match timeout(self.config.timeout(), self.fetch(&endpoint)).await {
            Ok(Ok(data)) => ServiceHealthResult::Healthy {
                url: base_url.clone(),
                data,
            },
            Ok(Err(error)) => ServiceHealthResult::Unhealthy {
                url: base_url.clone(),
                error,
            },
            Err(_) => ServiceHealthResult::Unhealthy {
                url: base_url.clone(),
                error: format!("Request timeout after {:?}", self.config.timeout()),
            },
        };

        let elapsed = start.elapsed();

        if let Some(metrics) = &self.metrics {
            metrics.record_health_check(metric_label, result.status(), elapsed);
        }

        match &result {
            ServiceHealthResult::Healthy { .. } => {
                debug!("{} is healthy ({} ms)", service_name, elapsed.as_millis());
            }
            ServiceHealthResult::Unhealthy { error, .. } => {
                warn!("{} is unhealthy: {}", service_name, error);
            }
        }

        result
    }

    async fn fetch(&self, endpoint: &str) -> std::result::Result<serde_json::Map<String, Value>, String> {
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(format!("HTTP {}", status));
        }

        match response.json::<Value>().await.map_err(|e| e.to_string())? {
            Value::Object(data) => Ok(data),
            other => Err(format!(
                "Failed to parse health response: expected a JSON object, got {}",
                json_kind(&other)
            )),
        }
    }

    /// Checks every service in order, one after another.
    pub async fn check_all(&self, services: &[ServiceConfig]) -> Vec<ServiceReport> {
        let mut reports = Vec::with_capacity(services.len());

        for service in services {
            let result = self
                .check_labelled(&service.api_url, &service.id, &service.api_name())
                .await;
            reports.push(ServiceReport {
                id: service.id.clone(),
                name: service.name.clone(),
                result,
            });
        }

        let summary = StatusSummary::from_results(reports.iter().map(|r| &r.result));

        if let Some(metrics) = &self.metrics {
            metrics.update_service_counts(summary);
        }

        info!(
            "Health check complete: {} healthy, {} unhealthy",
            summary.healthy,
            summary.total - summary.healthy
        );

        reports
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
