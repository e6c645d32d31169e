//! Process-scoped secret storage.

use std::collections::HashMap;
use std::fmt;

use crate::config::{ConfigError, GatewayConfig};

/// Fixed placeholder written wherever a secret value would otherwise appear
/// in logs or audit entries. Logged verbatim rather than omitting the field,
/// so reviewers can see that redaction happened.
pub const REDACTED: &str = "[REDACTED]";

/// A server-only credential.
///
/// The wrapped value is reachable only through [`Secret::expose`], which is
/// called at the single place a secret leaves the process: outbound request
/// construction. Debug and Display print the redaction placeholder.
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying credential.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// Read-only holder of every credential the enabled routes require.
pub struct SecretVault {
    secrets: HashMap<String, Secret>,
}

impl SecretVault {
    /// Resolve all secrets named by enabled routes from the process
    /// environment. Fails with the first missing variable; the process must
    /// not serve traffic in that state.
    pub fn from_env(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let mut required: Vec<(&'static str, &str)> = Vec::new();
        if config.captcha.enabled {
            required.push(("captcha", &config.captcha.secret_env));
        }
        if config.subscribe.enabled {
            required.push(("subscribe", &config.subscribe.api_key_env));
        }
        if config.webhook.enabled {
            required.push(("webhook", &config.webhook.secret_env));
        }

        let mut secrets = HashMap::new();
        for (route, env) in required {
            match std::env::var(env) {
                Ok(value) if !value.is_empty() => {
                    secrets.insert(env.to_string(), Secret::new(value));
                }
                _ => {
                    return Err(ConfigError::MissingSecret {
                        route,
                        env: env.to_string(),
                    });
                }
            }
        }

        tracing::info!(count = secrets.len(), "Secrets resolved");
        Ok(Self { secrets })
    }

    /// Look up a secret by the environment variable name that supplied it.
    /// Returns `None` only for refs that were not required at startup.
    pub fn get(&self, env_ref: &str) -> Option<&Secret> {
        self.secrets.get(env_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_debug_and_display_are_redacted() {
        let secret = Secret::new("super-sensitive");
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(format!("{secret}"), REDACTED);
        assert_eq!(secret.expose(), "super-sensitive");
    }

    #[test]
    fn missing_env_var_is_fatal() {
        let mut config = GatewayConfig::default();
        config.captcha.secret_env = "WAITLIST_GATEWAY_TEST_NO_SUCH_VAR".to_string();
        config.subscribe.enabled = false;
        config.webhook.enabled = false;

        let error = SecretVault::from_env(&config)
            .err()
            .expect("startup must fail without the secret");
        match error {
            ConfigError::MissingSecret { route, env } => {
                assert_eq!(route, "captcha");
                assert_eq!(env, "WAITLIST_GATEWAY_TEST_NO_SUCH_VAR");
            }
            other => panic!("expected MissingSecret, got {other:?}"),
        }
    }

    #[test]
    fn disabled_routes_need_no_secret() {
        let mut config = GatewayConfig::default();
        config.captcha.enabled = false;
        config.subscribe.enabled = false;
        config.webhook.enabled = false;

        let vault = SecretVault::from_env(&config).unwrap();
        assert!(vault.get("RECAPTCHA_SECRET_KEY").is_none());
    }

    #[test]
    fn resolves_present_env_var() {
        std::env::set_var("WAITLIST_GATEWAY_TEST_PRESENT", "value-1");
        let mut config = GatewayConfig::default();
        config.captcha.secret_env = "WAITLIST_GATEWAY_TEST_PRESENT".to_string();
        config.subscribe.enabled = false;
        config.webhook.enabled = false;

        let vault = SecretVault::from_env(&config).unwrap();
        let secret = vault.get("WAITLIST_GATEWAY_TEST_PRESENT").unwrap();
        assert_eq!(secret.expose(), "value-1");
    }
}
