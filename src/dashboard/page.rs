//! HTML dashboard page.
//!
//! A single self-contained document with inline CSS: one card per monitored
//! service, an overview row with the healthy count, and links to each
//! service's API documentation.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::config::{endpoint_url, Config, DetailField, FieldDisplay, ServiceConfig};
use crate::demo::DemoOutcome;
use crate::health::{ServiceHealthResult, ServiceReport, StatusSummary};

const HEALTHY_MARK: &str = "&#x2705;";
const UNHEALTHY_MARK: &str = "&#x274C;";

/// Everything one render needs. Borrowed from the handler for the duration
/// of a single request.
pub struct DashboardPage<'a> {
    pub config: &'a Config,
    pub reports: &'a [ServiceReport],
    /// Outcome of a demo request, keyed by service id.
    pub demo: Option<(&'a str, &'a DemoOutcome)>,
    pub checked_at: DateTime<Utc>,
}

impl<'a> DashboardPage<'a> {
    pub fn summary(&self) -> StatusSummary {
        StatusSummary::from_results(self.reports.iter().map(|r| &r.result))
    }

    pub fn render(&self) -> String {
        let title = escape_html(&self.config.dashboard.title);
        let mut html = String::with_capacity(8192);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"UTF-8\">\n");
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
        html.push_str(&format!("<title>{}</title>\n", title));
        html.push_str("<style>\n");
        html.push_str(INLINE_CSS);
        html.push_str("</style>\n</head>\n<body>\n");

        self.render_sidebar(&mut html);

        html.push_str("<main>\n");
        html.push_str(&format!("<h1 class=\"main-header\">{}</h1>\n", title));
        html.push_str(&format!(
            "<h3 class=\"subtitle\">{}</h3>\n",
            escape_html(&self.config.dashboard.subtitle)
        ));

        html.push_str("<div class=\"columns\">\n");
        for service in &self.config.services {
            if let Some(report) = self.report_for(&service.id) {
                self.render_service_column(&mut html, service, &report.result);
            }
        }
        html.push_str("</div>\n");

        self.render_overview(&mut html);
        self.render_api_docs(&mut html);
        render_footer(&mut html);

        html.push_str(&format!(
            "<p class=\"checked-at\">Last checked {}</p>\n",
            self.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        html.push_str("</main>\n</body>\n</html>\n");
        html
    }

    fn report_for(&self, id: &str) -> Option<&ServiceReport> {
        self.reports.iter().find(|r| r.id == id)
    }

    fn render_sidebar(&self, html: &mut String) {
        html.push_str("<nav class=\"sidebar\">\n<h2>Quick Links</h2>\n<ul>\n");
        for service in &self.config.services {
            html.push_str(&format!(
                "<li><a href=\"{}\">Open {} UI</a></li>\n",
                escape_html(service.ui_url.as_str()),
                escape_html(&service.name)
            ));
        }
        html.push_str("</ul>\n<hr>\n");
        html.push_str("<form method=\"get\" action=\"/\"><button type=\"submit\">Refresh Status</button></form>\n");
        html.push_str("</nav>\n");
    }

    fn render_service_column(&self, html: &mut String, service: &ServiceConfig, result: &ServiceHealthResult) {
        let api_name = escape_html(&service.api_name());

        html.push_str("<section class=\"column\">\n");
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(&service.name)));
        html.push_str("<div class=\"service-card\">\n");
        html.push_str(&format!("<h3>{}</h3>\n", api_name));

        match result {
            ServiceHealthResult::Healthy { url, data } => {
                html.push_str("<p><strong>Status</strong>: <span class=\"status-healthy\">Healthy</span></p>\n");
                html.push_str(&format!(
                    "<p><strong>URL</strong>: {}</p>\n",
                    escape_html(url.as_str().trim_end_matches('/'))
                ));
                for field in &service.details {
                    html.push_str(&format!(
                        "<p><strong>{}</strong>: {}</p>\n",
                        escape_html(&field.label),
                        render_detail(field, data)
                    ));
                }
            }
            ServiceHealthResult::Unhealthy { error, .. } => {
                html.push_str("<p><strong>Status</strong>: <span class=\"status-unhealthy\">Unhealthy</span></p>\n");
                html.push_str(&format!(
                    "<p><strong>Error</strong>: {}</p>\n",
                    escape_html(error)
                ));
            }
        }
        html.push_str("</div>\n");

        if let (true, Some(action)) = (result.is_healthy(), &service.demo) {
            html.push_str(&format!(
                "<form method=\"post\" action=\"/services/{}/demo\"><button type=\"submit\">{}</button></form>\n",
                escape_html(&service.id),
                escape_html(&action.label)
            ));
        }

        if let Some((id, outcome)) = self.demo {
            if id == service.id {
                let class = if outcome.is_success() { "demo-success" } else { "demo-failure" };
                html.push_str(&format!(
                    "<div class=\"{}\">{}</div>\n",
                    class,
                    escape_html(outcome.message())
                ));
            }
        }

        html.push_str(&format!(
            "<p><strong>UI</strong>: <a href=\"{}\">Open {} Interface</a></p>\n",
            escape_html(service.ui_url.as_str()),
            escape_html(&service.name)
        ));
        html.push_str("</section>\n");
    }

    fn render_overview(&self, html: &mut String) {
        let summary = self.summary();

        html.push_str("<hr>\n<h2>System Overview</h2>\n<div class=\"metrics\">\n");
        for service in &self.config.services {
            let mark = match self.report_for(&service.id) {
                Some(report) if report.result.is_healthy() => HEALTHY_MARK,
                _ => UNHEALTHY_MARK,
            };
            html.push_str(&format!(
                "<div class=\"metric\"><span class=\"metric-label\">{}</span><span class=\"metric-value\">{}</span></div>\n",
                escape_html(&service.name),
                mark
            ));
        }
        html.push_str(&format!(
            "<div class=\"metric\"><span class=\"metric-label\">Services Healthy</span><span class=\"metric-value\">{}/{}</span></div>\n",
            summary.healthy, summary.total
        ));
        html.push_str("</div>\n");
    }

    fn render_api_docs(&self, html: &mut String) {
        let health_path = &self.config.health_check.path;

        html.push_str("<hr>\n<h2>API Documentation</h2>\n<div class=\"columns\">\n");
        for service in &self.config.services {
            html.push_str("<section class=\"column\">\n");
            html.push_str(&format!("<h3>{}</h3>\n<ul>\n", escape_html(&service.api_name())));
            for (label, text, path) in [
                ("OpenAPI Docs", "Swagger UI", "/docs"),
                ("ReDoc", "Alternative Docs", "/redoc"),
                ("Health Check", "Health Endpoint", health_path.as_str()),
            ] {
                html.push_str(&format!(
                    "<li><strong>{}</strong>: <a href=\"{}\">{}</a></li>\n",
                    label,
                    escape_html(&endpoint_url(&service.api_url, path)),
                    text
                ));
            }
            html.push_str("</ul>\n</section>\n");
        }
        html.push_str("</div>\n");
    }
}

fn render_footer(html: &mut String) {
    html.push_str("<hr>\n<h3>Quick Start Commands</h3>\n<pre><code>");
    html.push_str(QUICK_START);
    html.push_str("</code></pre>\n");
    html.push_str("<h3>Support</h3>\n");
    html.push_str("<p>For issues or questions, please check the documentation or contact the development team.</p>\n");
}

/// Formats one detail field of a health body. Missing values render as a
/// placeholder rather than failing the card.
pub fn render_detail(field: &DetailField, data: &Map<String, Value>) -> String {
    let value = data.get(&field.key);
    match field.display {
        FieldDisplay::Text => match value {
            None | Some(Value::Null) => "Unknown".to_string(),
            Some(Value::String(s)) => escape_html(s),
            Some(other) => escape_html(&other.to_string()),
        },
        FieldDisplay::Flag => {
            if value.map(is_truthy).unwrap_or(false) {
                HEALTHY_MARK.to_string()
            } else {
                UNHEALTHY_MARK.to_string()
            }
        }
        FieldDisplay::Count => match value {
            None | Some(Value::Null) => "0".to_string(),
            Some(Value::Array(items)) => items.len().to_string(),
            Some(Value::Object(entries)) => entries.len().to_string(),
            Some(Value::String(s)) => s.chars().count().to_string(),
            Some(_) => "Unknown".to_string(),
        },
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const QUICK_START: &str = "# Start all services
make demo

# Or start individual services
make neuro-api
make trends-api

# Check health
make health
";

const INLINE_CSS: &str = r#"
body { margin: 0; font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; display: flex; color: #262730; }
.sidebar { width: 240px; min-height: 100vh; padding: 1.5rem; background: #f0f2f6; box-sizing: border-box; }
.sidebar ul { padding-left: 1rem; }
main { flex: 1; padding: 2rem 3rem; }
.main-header {
    font-size: 3rem;
    font-weight: bold;
    text-align: center;
    margin-bottom: 2rem;
    background: linear-gradient(90deg, #1f77b4, #ff7f0e);
    -webkit-background-clip: text;
    -webkit-text-fill-color: transparent;
    background-clip: text;
}
.subtitle { text-align: center; font-weight: normal; }
.columns { display: flex; gap: 2rem; }
.column { flex: 1; }
.service-card {
    background-color: #f8f9fa;
    padding: 1.5rem;
    border-radius: 10px;
    border-left: 4px solid #1f77b4;
    margin: 1rem 0;
}
.status-healthy { color: #28a745; font-weight: bold; }
.status-unhealthy { color: #dc3545; font-weight: bold; }
.demo-success { background: #d4edda; color: #155724; padding: 0.75rem; border-radius: 6px; margin: 0.5rem 0; }
.demo-failure { background: #f8d7da; color: #721c24; padding: 0.75rem; border-radius: 6px; margin: 0.5rem 0; }
.metrics { display: flex; gap: 2rem; }
.metric { display: flex; flex-direction: column; }
.metric-label { font-size: 0.9rem; color: #555; }
.metric-value { font-size: 2rem; }
button { padding: 0.4rem 1rem; border-radius: 6px; border: 1px solid #1f77b4; background: #fff; cursor: pointer; }
pre { background: #f0f2f6; padding: 1rem; border-radius: 6px; }
.checked-at { color: #888; font-size: 0.8rem; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use url::Url;

    fn report(id: &str, name: &str, result: ServiceHealthResult) -> ServiceReport {
        ServiceReport {
            id: id.to_string(),
            name: name.to_string(),
            result,
        }
    }

    fn healthy(url: &str, data: Value) -> ServiceHealthResult {
        ServiceHealthResult::Healthy {
            url: Url::parse(url).unwrap(),
            data: data.as_object().cloned().unwrap(),
        }
    }

    fn field(key: &str, display: FieldDisplay) -> DetailField {
        DetailField {
            label: key.to_string(),
            key: key.to_string(),
            display,
        }
    }

    #[test]
    fn renders_cards_and_overview() {
        let config = Config::default();
        let reports = vec![
            report(
                "neuro",
                "NeuroDegenerAI",
                healthy("http://localhost:9001", json!({"version": "1.0", "model_loaded": true})),
            ),
            report(
                "trends",
                "Trend Detector",
                ServiceHealthResult::Unhealthy {
                    url: Url::parse("http://localhost:9002").unwrap(),
                    error: "HTTP 503 Service Unavailable".to_string(),
                },
            ),
        ];
        let page = DashboardPage {
            config: &config,
            reports: &reports,
            demo: None,
            checked_at: Utc::now(),
        };

        let html = page.render();
        assert!(html.contains("<title>Neuro-Trends Suite Hub</title>"));
        assert!(html.contains("<strong>Version</strong>: 1.0"));
        assert!(html.contains("<strong>Timestamp</strong>: Unknown"));
        assert!(html.contains("<strong>URL</strong>: http://localhost:9001</p>"));
        assert!(html.contains("<strong>Error</strong>: HTTP 503 Service Unavailable"));
        assert!(html.contains("Services Healthy</span><span class=\"metric-value\">1/2"));
        assert!(html.contains("action=\"/services/neuro/demo\""));
        assert!(!html.contains("action=\"/services/trends/demo\""));
        assert!(html.contains("href=\"http://localhost:9002/redoc\""));
        assert!(html.contains("href=\"http://localhost:8502/\""));
    }

    #[test]
    fn demo_outcome_lands_on_its_card() {
        let config = Config::default();
        let reports = vec![
            report("neuro", "NeuroDegenerAI", healthy("http://localhost:9001", json!({}))),
            report("trends", "Trend Detector", healthy("http://localhost:9002", json!({}))),
        ];
        let outcome = DemoOutcome::Failure {
            error: "Test search failed: 500".to_string(),
        };
        let page = DashboardPage {
            config: &config,
            reports: &reports,
            demo: Some(("trends", &outcome)),
            checked_at: Utc::now(),
        };

        let html = page.render();
        assert!(html.contains("<div class=\"demo-failure\">Test search failed: 500</div>"));
        assert_eq!(html.matches("demo-failure\">").count(), 1);
    }

    #[test]
    fn remote_strings_are_escaped() {
        let data = json!({"version": "<script>alert(1)</script>"});
        let rendered = render_detail(&field("version", FieldDisplay::Text), data.as_object().unwrap());
        assert_eq!(rendered, "&lt;script&gt;alert(1)&lt;/script&gt;");
    }

    #[test]
    fn detail_fields_read_permissively() {
        let data = json!({
            "model_loaded": true,
            "services": {"db": "ok", "cache": "ok", "queue": "ok"},
            "uptime": 42
        });
        let data = data.as_object().unwrap();

        assert_eq!(render_detail(&field("model_loaded", FieldDisplay::Flag), data), HEALTHY_MARK);
        assert_eq!(render_detail(&field("missing", FieldDisplay::Flag), data), UNHEALTHY_MARK);
        assert_eq!(render_detail(&field("services", FieldDisplay::Count), data), "3");
        assert_eq!(render_detail(&field("missing", FieldDisplay::Count), data), "0");
        assert_eq!(render_detail(&field("uptime", FieldDisplay::Text), data), "42");
        assert_eq!(render_detail(&field("missing", FieldDisplay::Text), data), "Unknown");
    }
}
