// ────────────────────────────────
// src/dashboard/hub.rs
// Routes dashboard requests and runs the checks behind each render
// ────────────────────────────────

use chrono::Utc;
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::dashboard::{DashboardPage, HubError};
use crate::demo::{DemoOutcome, DemoProber};
use crate::health::{HealthChecker, ServiceReport, StatusSummary};
use crate::metrics::MetricsCollector;

pub struct Dashboard {
    config: Arc<Config>,
    checker: HealthChecker,
    prober: DemoProber,
    metrics: Option<Arc<MetricsCollector>>,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    services: &'a [ServiceReport],
    healthy: usize,
    total: usize,
    checked_at: String,
}

impl Dashboard {
    pub fn new(config: Arc<Config>, metrics: Option<Arc<MetricsCollector>>) -> anyhow::Result<Self> {
        let checker = HealthChecker::new(config.health_check.clone(), metrics.clone())?;
        let prober = DemoProber::new(&config.demo, metrics.clone())?;

        Ok(Self {
            config,
            checker,
            prober,
            metrics,
        })
    }

    pub async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, HubError> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => {
                allow(&method, Method::GET, &path, "GET")?;
                self.record_render("/");
                let reports = self.checker.check_all(&self.config.services).await;
                self.page_response(&reports, None)
            }
            ["api", "status"] => {
                allow(&method, Method::GET, &path, "GET")?;
                self.record_render("/api/status");
                self.status_response().await
            }
            ["services", id, "demo"] => {
                allow(&method, Method::POST, &path, "POST")?;
                self.record_render("/services/demo");
                self.demo_response(id).await
            }
            _ => Err(HubError::NotFound(path.clone())),
        }
    }

    async fn demo_response(&self, id: &str) -> Result<Response<Body>, HubError> {
        let service = self
            .config
            .service(id)
            .ok_or_else(|| HubError::UnknownService(id.to_string()))?;
        let action = service
            .demo
            .as_ref()
            .ok_or_else(|| HubError::NotFound(format!("/services/{}/demo", id)))?;

        let reports = self.checker.check_all(&self.config.services).await;

        // The demo button is only offered on a healthy card.
        let outcome = match reports.iter().find(|r| r.id == service.id) {
            Some(report) if report.result.is_healthy() => {
                Some(self.prober.run(&service.api_url, &service.id, action).await)
            }
            _ => {
                debug!("Skipping demo for {}: service is unhealthy", service.id);
                None
            }
        };

        self.page_response(
            &reports,
            outcome.as_ref().map(|o: &DemoOutcome| (service.id.as_str(), o)),
        )
    }

    fn page_response(
        &self,
        reports: &[ServiceReport],
        demo: Option<(&str, &DemoOutcome)>,
    ) -> Result<Response<Body>, HubError> {
        let page = DashboardPage {
            config: &self.config,
            reports,
            demo,
            checked_at: Utc::now(),
        };

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/html; charset=utf-8")
            .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
            .body(Body::from(page.render()))?;
        Ok(response)
    }

    async fn status_response(&self) -> Result<Response<Body>, HubError> {
        let reports = self.checker.check_all(&self.config.services).await;
        let summary = StatusSummary::from_results(reports.iter().map(|r| &r.result));

        let body = serde_json::to_vec(&StatusBody {
            services: &reports,
            healthy: summary.healthy,
            total: summary.total,
            checked_at: Utc::now().to_rfc3339(),
        })?;

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
            .body(Body::from(body))?;
        Ok(response)
    }

    fn record_render(&self, route: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_render(route);
        }
    }
}

fn allow(method: &Method, expected: Method, path: &str, allow: &'static str) -> Result<(), HubError> {
    if *method == expected {
        Ok(())
    } else {
        Err(HubError::MethodNotAllowed {
            method: method.clone(),
            path: path.to_string(),
            allow,
        })
    }
}
