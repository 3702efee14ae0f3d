// src/health/status.rs
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Outcome of one health poll. Built fresh per check and never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ServiceHealthResult {
    Healthy {
        url: Url,
        data: Map<String, Value>,
    },
    Unhealthy {
        url: Url,
        error: String,
    },
}

impl ServiceHealthResult {
    pub fn status(&self) -> HealthStatus {
        match self {
            ServiceHealthResult::Healthy { .. } => HealthStatus::Healthy,
            ServiceHealthResult::Unhealthy { .. } => HealthStatus::Unhealthy,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status() == HealthStatus::Healthy
    }

    pub fn url(&self) -> &Url {
        match self {
            ServiceHealthResult::Healthy { url, .. } | ServiceHealthResult::Unhealthy { url, .. } => url,
        }
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        match self {
            ServiceHealthResult::Healthy { data, .. } => Some(data),
            ServiceHealthResult::Unhealthy { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ServiceHealthResult::Healthy { .. } => None,
            ServiceHealthResult::Unhealthy { error, .. } => Some(error),
        }
    }
}

/// "N of M services healthy".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub healthy: usize,
    pub total: usize,
}

impl StatusSummary {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a ServiceHealthResult>,
    {
        results
            .into_iter()
            .fold(Self { healthy: 0, total: 0 }, |acc, result| Self {
                healthy: acc.healthy + usize::from(result.is_healthy()),
                total: acc.total + 1,
            })
    }

    pub fn all_healthy(&self) -> bool {
        self.healthy == self.total
    }
}
