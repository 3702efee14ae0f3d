// src/health/mod.rs
mod checker;
mod status;

pub(crate) use checker::json_kind;
pub use checker::{HealthChecker, ServiceReport};
pub use status::{HealthStatus, ServiceHealthResult, StatusSummary};
