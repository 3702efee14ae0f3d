// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "hub.yaml";

/// Load configuration from a file (YAML or JSON)
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = parse_config(path, &contents)?;
    config.validate()?;
    Ok(config)
}

/// Resolve the configuration for a run: an explicit path must load, the
/// default file is used when present, built-in defaults otherwise. Environment
/// overrides are applied last.
pub async fn resolve_config(explicit: Option<&str>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            load_config(path).await?
        }
        None if tokio::fs::try_exists(DEFAULT_CONFIG_FILE).await.unwrap_or(false) => {
            tracing::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
            load_config(DEFAULT_CONFIG_FILE).await?
        }
        None => {
            tracing::info!("No config file found, using built-in service addresses");
            Config::default()
        }
    };

    config
        .apply_env_overrides()
        .context("Failed to apply environment overrides")?;
    config.validate()?;
    Ok(config)
}

fn parse_config(path: &Path, contents: &str) -> Result<Config> {
    let extension = path.extension().and_then(|s| s.to_str());
    let config = if extension == Some("yaml") || extension == Some("yml") {
        serde_yaml::from_str(contents).context("Failed to parse YAML config")?
    } else {
        serde_json::from_str(contents).context("Failed to parse JSON config")?
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_parser_from_extension() {
        let json = r#"{"health_check": {"timeout_ms": 250}}"#;
        let config = parse_config(Path::new("hub.json"), json).unwrap();
        assert_eq!(config.health_check.timeout_ms, 250);
        assert_eq!(config.services.len(), 2);

        let yaml = "health_check:\n  path: /healthz\n";
        let config = parse_config(Path::new("hub.yml"), yaml).unwrap();
        assert_eq!(config.health_check.path, "/healthz");
    }

    #[test]
    fn parse_errors_name_the_format() {
        let err = parse_config(Path::new("hub.yaml"), "services: [").unwrap_err();
        assert!(err.to_string().contains("YAML"));

        let err = parse_config(Path::new("hub.json"), "{").unwrap_err();
        assert!(err.to_string().contains("JSON"));
    }

    #[tokio::test]
    async fn shipped_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/hub.yaml");
        let config = load_config(path).await.unwrap();
        let defaults = Config::default();

        assert_eq!(config.server.listen_addr, defaults.server.listen_addr);
        assert_eq!(config.services.len(), defaults.services.len());
        for (loaded, builtin) in config.services.iter().zip(&defaults.services) {
            assert_eq!(loaded.id, builtin.id);
            assert_eq!(loaded.api_url, builtin.api_url);
            assert_eq!(loaded.ui_url, builtin.ui_url);
            assert_eq!(loaded.details.len(), builtin.details.len());
            assert_eq!(
                loaded.demo.as_ref().map(|d| &d.body),
                builtin.demo.as_ref().map(|d| &d.body)
            );
        }
    }

    #[tokio::test]
    async fn missing_explicit_file_is_an_error() {
        let err = load_config("/nonexistent/hub.yaml").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
