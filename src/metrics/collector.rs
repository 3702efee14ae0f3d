// src/metrics/collector.rs
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use anyhow::Result;

use crate::health::{HealthStatus, StatusSummary};

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Health check metrics
    pub health_checks_total: IntCounterVec,
    pub health_check_duration_seconds: HistogramVec,
    pub service_health_status: IntGaugeVec,

    // Demo probe metrics
    pub demo_requests_total: IntCounterVec,

    // Dashboard metrics
    pub page_renders_total: IntCounterVec,
    pub healthy_services: IntGauge,
    pub total_services: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let health_checks_total = IntCounterVec::new(
            Opts::new("hub_health_checks_total", "Total number of health checks"),
            &["service", "status"],
        )?;
        registry.register(Box::new(health_checks_total.clone()))?;

        let health_check_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "hub_health_check_duration_seconds",
                "Health check duration in seconds",
            ),
            &["service"],
        )?;
        registry.register(Box::new(health_check_duration_seconds.clone()))?;

        let service_health_status = IntGaugeVec::new(
            Opts::new(
                "hub_service_health_status",
                "Service health status (1=healthy, 0=unhealthy)",
            ),
            &["service"],
        )?;
        registry.register(Box::new(service_health_status.clone()))?;

        let demo_requests_total = IntCounterVec::new(
            Opts::new("hub_demo_requests_total", "Total demo requests"),
            &["service", "outcome"],
        )?;
        registry.register(Box::new(demo_requests_total.clone()))?;

        let page_renders_total = IntCounterVec::new(
            Opts::new("hub_page_renders_total", "Total dashboard renders"),
            &["route"],
        )?;
        registry.register(Box::new(page_renders_total.clone()))?;

        let healthy_services =
            IntGauge::new("hub_healthy_services", "Number of healthy services")?;
        registry.register(Box::new(healthy_services.clone()))?;

        let total_services =
            IntGauge::new("hub_total_services", "Total number of monitored services")?;
        registry.register(Box::new(total_services.clone()))?;

        Ok(Self {
            health_checks_total,
            health_check_duration_seconds,
            service_health_status,
            demo_requests_total,
            page_renders_total,
            healthy_services,
            total_services,
        })
    }

    pub fn record_health_check(
        &self,
        service: &str,
        status: HealthStatus,
        duration: std::time::Duration,
    ) {
        self.health_checks_total
            .with_label_values(&[service, status.as_str()])
            .inc();

        self.health_check_duration_seconds
            .with_label_values(&[service])
            .observe(duration.as_secs_f64());

        let value = if status == HealthStatus::Healthy { 1 } else { 0 };
        self.service_health_status
            .with_label_values(&[service])
            .set(value);
    }

    pub fn record_demo(&self, service: &str, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.demo_requests_total
            .with_label_values(&[service, outcome])
            .inc();
    }

    pub fn record_render(&self, route: &str) {
        self.page_renders_total.with_label_values(&[route]).inc();
    }

    pub fn update_service_counts(&self, summary: StatusSummary) {
        self.healthy_services.set(summary.healthy as i64);
        self.total_services.set(summary.total as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn gathers_recorded_checks() {
        let registry = MetricsRegistry::new().unwrap();
        let metrics = registry.collector();

        metrics.record_health_check("neuro", HealthStatus::Healthy, Duration::from_millis(12));
        metrics.record_health_check("trends", HealthStatus::Unhealthy, Duration::from_millis(40));
        metrics.record_demo("trends", false);
        metrics.update_service_counts(StatusSummary { healthy: 1, total: 2 });

        let text = String::from_utf8(registry.gather().unwrap()).unwrap();
        assert!(text.contains(r#"hub_health_checks_total{service="neuro",status="healthy"} 1"#));
        assert!(text.contains(r#"hub_service_health_status{service="trends"} 0"#));
        assert!(text.contains(r#"hub_demo_requests_total{outcome="failure",service="trends"} 1"#));
        assert!(text.contains("hub_healthy_services 1"));
        assert!(text.contains("hub_total_services 2"));
    }
}
