//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check allow-lists are usable for enabled routes
//! - Validate value ranges (limits > 0, score within 0..=1)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: GatewayConfig -> Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{GatewayConfig, RateLimitConfig};

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `captcha.min_score`.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn check_rate_limit(prefix: &str, rl: &RateLimitConfig, errors: &mut Vec<ValidationError>) {
    if rl.max == 0 {
        errors.push(err(&format!("{prefix}.rate_limit.max"), "must be > 0"));
    }
    if rl.window_secs == 0 {
        errors.push(err(
            &format!("{prefix}.rate_limit.window_secs"),
            "must be > 0",
        ));
    }
}

/// Validate a configuration, collecting every semantic error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(err(
            "listener.bind_address",
            "not a valid socket address",
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(err("listener.max_body_bytes", "must be > 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(err("timeouts.request_secs", "must be > 0"));
    }
    if config.timeouts.downstream_secs == 0 {
        errors.push(err("timeouts.downstream_secs", "must be > 0"));
    }

    for origin in &config.cors.allowed_origins {
        if Url::parse(origin).is_err() {
            errors.push(err(
                "cors.allowed_origins",
                format!("`{origin}` is not a valid origin URL"),
            ));
        }
    }

    if config.captcha.enabled {
        if config.captcha.secret_env.is_empty() {
            errors.push(err("captcha.secret_env", "must name an environment variable"));
        }
        if Url::parse(&config.captcha.verify_url).is_err() {
            errors.push(err("captcha.verify_url", "not a valid URL"));
        }
        if !(0.0..=1.0).contains(&config.captcha.min_score) {
            errors.push(err("captcha.min_score", "must be within 0.0 ..= 1.0"));
        }
        if config.captcha.allowed_actions.is_empty() {
            errors.push(err("captcha.allowed_actions", "must not be empty"));
        }
        check_rate_limit("captcha", &config.captcha.rate_limit, &mut errors);
    }

    if config.subscribe.enabled {
        if config.subscribe.api_key_env.is_empty() {
            errors.push(err(
                "subscribe.api_key_env",
                "must name an environment variable",
            ));
        }
        if Url::parse(&config.subscribe.base_url).is_err() {
            errors.push(err("subscribe.base_url", "not a valid URL"));
        }
        if config.subscribe.allowed_audiences.is_empty() {
            errors.push(err("subscribe.allowed_audiences", "must not be empty"));
        }
        check_rate_limit("subscribe", &config.subscribe.rate_limit, &mut errors);
    }

    if config.webhook.enabled {
        if config.webhook.secret_env.is_empty() {
            errors.push(err("webhook.secret_env", "must name an environment variable"));
        }
        if config.webhook.allowed_webhooks.is_empty() {
            errors.push(err("webhook.allowed_webhooks", "must not be empty"));
        }
        for target in &config.webhook.allowed_webhooks {
            if Url::parse(target).is_err() {
                errors.push(err(
                    "webhook.allowed_webhooks",
                    format!("`{target}` is not a valid URL"),
                ));
            }
        }
        check_rate_limit("webhook", &config.webhook.rate_limit, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.subscribe.allowed_audiences = vec!["aud_1".into()];
        config.webhook.allowed_webhooks = vec!["https://hook.example/a".into()];
        config
    }

    #[test]
    fn accepts_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn rejects_zero_rate_limit() {
        let mut config = valid_config();
        config.captcha.rate_limit.max = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "captcha.rate_limit.max"));
    }

    #[test]
    fn rejects_out_of_range_score() {
        let mut config = valid_config();
        config.captcha.min_score = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "captcha.min_score"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = valid_config();
        config.captcha.min_score = -0.1;
        config.webhook.allowed_webhooks = vec!["not a url".into()];
        config.timeouts.downstream_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3, "expected all errors, got {errors:?}");
    }

    #[test]
    fn disabled_routes_skip_allow_list_checks() {
        let mut config = valid_config();
        config.webhook.enabled = false;
        config.webhook.allowed_webhooks.clear();
        assert!(validate_config(&config).is_ok());
    }
}
