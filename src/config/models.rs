// src/config/models.rs
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("at least one service must be configured")]
    NoServices,

    #[error("invalid service id {0:?}: use lowercase letters, digits, '-' or '_'")]
    InvalidServiceId(String),

    #[error("duplicate service id {0:?}")]
    DuplicateServiceId(String),

    #[error("{field} for service {service:?} must be an http(s) URL with a host and no query or fragment, got {url}")]
    InvalidUrl {
        service: String,
        field: &'static str,
        url: String,
    },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("{field} must start with '/', got {value:?}")]
    InvalidPath { field: String, value: String },

    #[error("metrics port {0} collides with the dashboard listen port")]
    PortCollision(u16),

    #[error("invalid value for {key}: {reason}")]
    InvalidOverride { key: String, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub dashboard: DashboardConfig,
    pub health_check: HealthCheckConfig,
    pub demo: DemoConfig,
    pub metrics: MetricsConfig,
    pub services: Vec<ServiceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            dashboard: DashboardConfig::default(),
            health_check: HealthCheckConfig::default(),
            demo: DemoConfig::default(),
            metrics: MetricsConfig::default(),
            services: default_services(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.services.is_empty() {
            return Err(ConfigError::NoServices);
        }

        if self.health_check.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("health_check.timeout_ms"));
        }
        if self.demo.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("demo.timeout_ms"));
        }

        check_path("health_check.path", &self.health_check.path)?;
        if self.metrics.enabled {
            check_path("metrics.path", &self.metrics.path)?;
            if self.metrics.port == self.server.listen_addr.port() {
                return Err(ConfigError::PortCollision(self.metrics.port));
            }
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if service.id.is_empty()
                || !service
                    .id
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
            {
                return Err(ConfigError::InvalidServiceId(service.id.clone()));
            }
            if !seen.insert(service.id.as_str()) {
                return Err(ConfigError::DuplicateServiceId(service.id.clone()));
            }

            check_origin(&service.id, "api_url", &service.api_url)?;
            check_origin(&service.id, "ui_url", &service.ui_url)?;

            if let Some(action) = &service.demo {
                check_path(&format!("services.{}.demo.path", service.id), &action.path)?;
            }
        }

        Ok(())
    }

    /// Applies `HUB_LISTEN_ADDR`, `HUB_<ID>_API_URL` and `HUB_<ID>_UI_URL`
    /// from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("HUB_LISTEN_ADDR") {
            self.server.listen_addr = value.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidOverride {
                    key: "HUB_LISTEN_ADDR".to_string(),
                    reason: e.to_string(),
                }
            })?;
        }

        for service in &mut self.services {
            let prefix = format!("HUB_{}", service.id.to_ascii_uppercase().replace('-', "_"));

            for (suffix, target) in [("API_URL", &mut service.api_url), ("UI_URL", &mut service.ui_url)] {
                let key = format!("{}_{}", prefix, suffix);
                if let Some(value) = lookup(&key) {
                    *target = Url::parse(&value).map_err(|e| ConfigError::InvalidOverride {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
                }
            }
        }

        Ok(())
    }

    pub fn service(&self, id: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.id == id)
    }
}

fn check_path(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with('/') {
        Ok(())
    } else {
        Err(ConfigError::InvalidPath {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

fn check_origin(service: &str, field: &'static str, url: &Url) -> Result<(), ConfigError> {
    let scheme_ok = matches!(url.scheme(), "http" | "https");
    // Paths are appended to the base as text, so a query or fragment would
    // swallow them.
    let bare = url.query().is_none() && url.fragment().is_none();
    if scheme_ok && bare && url.host_str().is_some() {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            service: service.to_string(),
            field,
            url: url.to_string(),
        })
    }
}

/// Joins `path` onto `base` by plain concatenation, so a base carrying a
/// path prefix keeps it.
pub fn endpoint_url(base: &Url, path: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), path)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8500)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub subtitle: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Neuro-Trends Suite Hub".to_string(),
            subtitle: "Unified Dashboard for NeuroDegenerAI & Real-Time Trend Detector".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    pub path: String,
    pub timeout_ms: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            path: "/health".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl HealthCheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub timeout_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

impl DemoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9500,
            path: "/metrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub id: String,
    pub name: String,
    pub api_url: Url,
    pub ui_url: Url,
    #[serde(default)]
    pub details: Vec<DetailField>,
    #[serde(default)]
    pub demo: Option<DemoAction>,
}

impl ServiceConfig {
    pub fn api_name(&self) -> String {
        format!("{} API", self.name)
    }
}

/// A field of the service's health body shown on its card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailField {
    pub label: String,
    pub key: String,
    #[serde(default)]
    pub display: FieldDisplay,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDisplay {
    #[default]
    Text,
    Flag,
    Count,
}

/// One-off example request against a service's primary endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoAction {
    /// Button label, e.g. "Test Prediction".
    pub label: String,
    /// Noun used in outcome messages, e.g. "prediction".
    pub action: String,
    #[serde(default)]
    pub method: DemoMethod,
    /// Path (and query string) appended to the service's API URL.
    pub path: String,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    pub summary: DemoSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DemoMethod {
    #[default]
    Get,
    Post,
}

/// How a successful demo response is condensed into one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DemoSummary {
    /// "Result: <body[field]>"
    Field { field: String },
    /// "Found <len(body[field])> <noun>"
    Count { field: String, noun: String },
}

fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig {
            id: "neuro".to_string(),
            name: "NeuroDegenerAI".to_string(),
            api_url: Url::parse("http://localhost:9001").expect("static url"),
            ui_url: Url::parse("http://localhost:8501").expect("static url"),
            details: vec![
                DetailField {
                    label: "Version".to_string(),
                    key: "version".to_string(),
                    display: FieldDisplay::Text,
                },
                DetailField {
                    label: "Model Loaded".to_string(),
                    key: "model_loaded".to_string(),
                    display: FieldDisplay::Flag,
                },
                DetailField {
                    label: "Timestamp".to_string(),
                    key: "timestamp".to_string(),
                    display: FieldDisplay::Text,
                },
            ],
            demo: Some(DemoAction {
                label: "Test Prediction".to_string(),
                action: "prediction".to_string(),
                method: DemoMethod::Post,
                path: "/predict/tabular".to_string(),
                body: Some(serde_json::json!({
                    "age": 75.0,
                    "sex": 0,
                    "apoe4": 1,
                    "mmse": 24.0,
                    "abeta": 180.0,
                    "tau": 350.0,
                    "ptau": 28.0
                })),
                summary: DemoSummary::Field {
                    field: "prediction".to_string(),
                },
            }),
        },
        ServiceConfig {
            id: "trends".to_string(),
            name: "Trend Detector".to_string(),
            api_url: Url::parse("http://localhost:9002").expect("static url"),
            ui_url: Url::parse("http://localhost:8502").expect("static url"),
            details: vec![
                DetailField {
                    label: "Version".to_string(),
                    key: "version".to_string(),
                    display: FieldDisplay::Text,
                },
                DetailField {
                    label: "Services".to_string(),
                    key: "services".to_string(),
                    display: FieldDisplay::Count,
                },
                DetailField {
                    label: "Timestamp".to_string(),
                    key: "timestamp".to_string(),
                    display: FieldDisplay::Text,
                },
            ],
            demo: Some(DemoAction {
                label: "Test Search".to_string(),
                action: "search".to_string(),
                method: DemoMethod::Get,
                path: "/topics/top?window=24&k=5".to_string(),
                body: None,
                summary: DemoSummary::Count {
                    field: "topics".to_string(),
                    noun: "topics".to_string(),
                },
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_suite_layout() {
        let config = Config::default();
        config.validate().unwrap();

        let neuro = config.service("neuro").unwrap();
        assert_eq!(neuro.api_url.as_str(), "http://localhost:9001/");
        assert_eq!(neuro.ui_url.as_str(), "http://localhost:8501/");
        assert_eq!(neuro.api_name(), "NeuroDegenerAI API");

        let trends = config.service("trends").unwrap();
        assert_eq!(trends.api_url.as_str(), "http://localhost:9002/");
        assert_eq!(trends.ui_url.as_str(), "http://localhost:8502/");

        assert_eq!(config.health_check.timeout(), Duration::from_secs(5));
        assert_eq!(config.demo.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn endpoint_url_keeps_base_prefix() {
        let base = Url::parse("http://localhost:9001").unwrap();
        assert_eq!(endpoint_url(&base, "/health"), "http://localhost:9001/health");

        let prefixed = Url::parse("http://gateway/neuro/").unwrap();
        assert_eq!(endpoint_url(&prefixed, "/health"), "http://gateway/neuro/health");
    }

    #[test]
    fn rejects_non_http_urls() {
        let mut config = Config::default();
        config.services[0].api_url = Url::parse("ftp://localhost:9001").unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "api_url", .. })
        ));
    }

    #[test]
    fn rejects_query_and_fragment_in_base_urls() {
        let mut config = Config::default();
        config.services[0].api_url = Url::parse("http://localhost:9001/?token=abc").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "api_url", .. })
        ));

        let mut config = Config::default();
        config.services[1].ui_url = Url::parse("http://localhost:8502/#top").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "ui_url", .. })
        ));
    }

    #[test]
    fn rejects_duplicate_and_malformed_ids() {
        let mut config = Config::default();
        config.services[1].id = "neuro".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateServiceId("neuro".to_string()))
        );

        config.services[1].id = "Trend Detector".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidServiceId("Trend Detector".to_string()))
        );
    }

    #[test]
    fn rejects_zero_timeouts_and_empty_service_list() {
        let mut config = Config::default();
        config.health_check.timeout_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroTimeout("health_check.timeout_ms"))
        );

        let mut config = Config::default();
        config.services.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoServices));
    }

    #[test]
    fn rejects_metrics_on_dashboard_port() {
        let mut config = Config::default();
        config.metrics.enabled = true;
        config.metrics.port = config.server.listen_addr.port();
        assert_eq!(config.validate(), Err(ConfigError::PortCollision(8500)));
    }

    #[test]
    fn overrides_replace_urls_and_listen_addr() {
        let mut config = Config::default();
        config
            .apply_overrides(|key| match key {
                "HUB_LISTEN_ADDR" => Some("127.0.0.1:9999".to_string()),
                "HUB_TRENDS_API_URL" => Some("https://trends.internal".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.server.listen_addr.port(), 9999);
        assert_eq!(
            config.service("trends").unwrap().api_url.as_str(),
            "https://trends.internal/"
        );
        assert_eq!(
            config.service("neuro").unwrap().api_url.as_str(),
            "http://localhost:9001/"
        );
    }

    #[test]
    fn bad_override_is_reported_with_its_key() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| (key == "HUB_NEURO_UI_URL").then(|| "not a url".to_string()))
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidOverride { ref key, .. } if key == "HUB_NEURO_UI_URL"));
    }

    #[test]
    fn yaml_services_fill_in_defaults() {
        let yaml = r#"
server:
  listen_addr: "127.0.0.1:8600"
services:
  - id: search
    name: Search
    api_url: "http://search:7000"
    ui_url: "http://search:7001"
    demo:
      label: Test Search
      action: search
      path: /query?q=rust
      summary:
        kind: count
        field: hits
        noun: hits
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.server.listen_addr.port(), 8600);
        assert_eq!(config.health_check.path, "/health");
        assert_eq!(config.services.len(), 1);

        let demo = config.services[0].demo.as_ref().unwrap();
        assert_eq!(demo.method, DemoMethod::Get);
        assert_eq!(
            demo.summary,
            DemoSummary::Count {
                field: "hits".to_string(),
                noun: "hits".to_string()
            }
        );
    }
}
