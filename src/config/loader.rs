//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration and startup failures.
///
/// Every variant is fatal: the process must not serve traffic with an
/// unresolved configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Missing secret: environment variable `{env}` is required for the {route} route")]
    MissingSecret { route: &'static str, env: String },

    #[error("HTTP client initialization failed: {0}")]
    Client(String),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let toml = r#"
            [listener]
            bind_address = "127.0.0.1:3001"

            [subscribe]
            allowed_audiences = ["aud_1"]

            [webhook]
            allowed_webhooks = ["https://hook.example/a"]

            [captcha.rate_limit]
            max = 5
            window_secs = 30
        "#;
        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:3001");
        assert_eq!(config.captcha.rate_limit.max, 5);
        assert_eq!(config.captcha.min_score, 0.5);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn missing_secret_error_names_the_variable() {
        let e = ConfigError::MissingSecret {
            route: "webhook",
            env: "WEBHOOK_SECRET".to_string(),
        };
        let msg = e.to_string();
        assert!(msg.contains("WEBHOOK_SECRET"));
        assert!(msg.contains("webhook"));
    }
}
