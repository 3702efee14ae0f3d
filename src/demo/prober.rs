// src/demo/prober.rs
use crate::config::{endpoint_url, DemoAction, DemoConfig, DemoMethod, DemoSummary};
use crate::health::json_kind;
use crate::metrics::MetricsCollector;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum DemoOutcome {
    Success { summary: String },
    Failure { error: String },
}

impl DemoOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DemoOutcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            DemoOutcome::Success { summary } => summary,
            DemoOutcome::Failure { error } => error,
        }
    }
}

/// Fires the one-off example request a service card offers.
pub struct DemoProber {
    client: Client,
    metrics: Option<Arc<MetricsCollector>>,
}

impl DemoProber {
    pub fn new(config: &DemoConfig, metrics: Option<Arc<MetricsCollector>>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(0)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, metrics })
    }

    /// Never fails: transport, status and decoding errors all come back as
    /// [`DemoOutcome::Failure`].
    pub async fn run(&self, base_url: &Url, service_id: &str, action: &DemoAction) -> DemoOutcome {
        let endpoint = endpoint_url(base_url, &action.path);

        let request = match action.method {
            DemoMethod::Get => self.client.get(&endpoint),
            DemoMethod::Post => self.client.post(&endpoint),
        };
        let request = match &action.body {
            Some(body) => request.json(body),
            None => request,
        };

        let outcome = match request.send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                match response.json::<Value>().await {
                    Ok(body @ Value::Object(_)) => DemoOutcome::Success {
                        summary: format!(
                            "Test {} successful! {}",
                            action.action,
                            summarize(&action.summary, &body)
                        ),
                    },
                    Ok(other) => DemoOutcome::Failure {
                        error: format!(
                            "Test {} error: expected a JSON object, got {}",
                            action.action,
                            json_kind(&other)
                        ),
                    },
                    Err(e) => DemoOutcome::Failure {
                        error: format!("Test {} error: {}", action.action, e),
                    },
                }
            }
            Ok(response) => DemoOutcome::Failure {
                error: format!("Test {} failed: {}", action.action, response.status().as_u16()),
            },
            Err(e) => DemoOutcome::Failure {
                error: format!("Test {} error: {}", action.action, e),
            },
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_demo(service_id, outcome.is_success());
        }

        match &outcome {
            DemoOutcome::Success { summary } => info!("{} demo: {}", service_id, summary),
            DemoOutcome::Failure { error } => warn!("{} demo: {}", service_id, error),
        }

        outcome
    }
}

fn summarize(summary: &DemoSummary, body: &Value) -> String {
    match summary {
        DemoSummary::Field { field } => {
            let value = match body.get(field) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "Unknown".to_string(),
                Some(other) => other.to_string(),
            };
            format!("Result: {}", value)
        }
        DemoSummary::Count { field, noun } => {
            let count = match body.get(field) {
                Some(Value::Array(items)) => items.len(),
                Some(Value::Object(entries)) => entries.len(),
                _ => 0,
            };
            format!("Found {} {}", count, noun)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use mockito::{Matcher, Server};

    fn prober() -> DemoProber {
        DemoProber::new(&DemoConfig { timeout_ms: 5_000 }, None).unwrap()
    }

    fn action(id: &str) -> DemoAction {
        Config::default().service(id).unwrap().demo.clone().unwrap()
    }

    #[tokio::test]
    async fn prediction_posts_fixed_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/predict/tabular")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "age": 75.0,
                "apoe4": 1,
                "ptau": 28.0
            })))
            .with_status(200)
            .with_body(r#"{"prediction":"MCI","confidence":0.82}"#)
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let outcome = prober().run(&url, "neuro", &action("neuro")).await;

        mock.assert_async().await;
        assert_eq!(
            outcome,
            DemoOutcome::Success {
                summary: "Test prediction successful! Result: MCI".to_string()
            }
        );
    }

    #[tokio::test]
    async fn search_counts_topics() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/topics/top")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("window".into(), "24".into()),
                Matcher::UrlEncoded("k".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"topics":[{"id":1},{"id":2},{"id":3}]}"#)
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let outcome = prober().run(&url, "trends", &action("trends")).await;

        assert_eq!(outcome.message(), "Test search successful! Found 3 topics");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict/tabular")
            .with_status(422)
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let outcome = prober().run(&url, "neuro", &action("neuro")).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), "Test prediction failed: 422");
    }

    #[tokio::test]
    async fn non_object_body_is_a_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict/tabular")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"["MCI"]"#)
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let outcome = prober().run(&url, "neuro", &action("neuro")).await;

        assert_eq!(
            outcome,
            DemoOutcome::Failure {
                error: "Test prediction error: expected a JSON object, got an array".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_a_failure() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let url = Url::parse(&format!("http://{}", addr)).unwrap();

        let outcome = prober().run(&url, "trends", &action("trends")).await;

        assert!(outcome.message().starts_with("Test search error: "));
    }

    #[test]
    fn missing_fields_fall_back_to_placeholders() {
        let field = DemoSummary::Field {
            field: "prediction".to_string(),
        };
        assert_eq!(summarize(&field, &serde_json::json!({})), "Result: Unknown");
        assert_eq!(summarize(&field, &serde_json::json!({"prediction": 0.7})), "Result: 0.7");

        let count = DemoSummary::Count {
            field: "topics".to_string(),
            noun: "topics".to_string(),
        };
        assert_eq!(summarize(&count, &serde_json::json!({"topics": null})), "Found 0 topics");
    }
}
