//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! Secrets are never part of this schema: route sections name the
//! environment variable holding the credential, and the vault resolves it
//! at startup.

use serde::{Deserialize, Serialize};

/// Root configuration for the outbound proxy gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// CORS / origin allow-list configuration.
    pub cors: CorsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Cross-route security thresholds.
    pub security: SecurityPolicyConfig,

    /// CAPTCHA verification route (`/api/recaptcha-proxy`).
    pub captcha: CaptchaRouteConfig,

    /// Email-list subscription route (`/api/resend-proxy`).
    pub subscribe: SubscribeRouteConfig,

    /// Webhook relay route (`/api/webhook-proxy`).
    pub webhook: WebhookRouteConfig,

    /// Audit logging settings.
    pub audit: AuditConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,

    /// Maximum inbound request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            max_body_bytes: 256 * 1024,
        }
    }
}

/// CORS configuration.
///
/// Requests carrying an `Origin` header outside `allowed_origins` are
/// rejected. Requests with no `Origin` header at all are permitted so that
/// non-browser callers keep working; this is a deliberate trade-off carried
/// over from the original deployment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the gateway from a browser.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time budget for an inbound request in seconds.
    pub request_secs: u64,

    /// Timeout for a single downstream API call in seconds.
    pub downstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            downstream_secs: 5,
        }
    }
}

/// Thresholds for the cheap local security checks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityPolicyConfig {
    /// Minimum render-to-submit time in milliseconds. Submissions reporting
    /// less than this are rejected as automated.
    pub min_submission_ms: u64,
}

impl Default for SecurityPolicyConfig {
    fn default() -> Self {
        Self {
            min_submission_ms: 2000,
        }
    }
}

/// Per-route rate limit: fixed window counter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per window per client.
    pub max: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max: 10,
            window_secs: 60,
        }
    }
}

/// CAPTCHA verification route configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptchaRouteConfig {
    /// Enable the route. Disabled routes return 404 and need no secret.
    pub enabled: bool,

    /// Environment variable holding the CAPTCHA service secret key.
    pub secret_env: String,

    /// Verification endpoint of the CAPTCHA service.
    pub verify_url: String,

    /// Minimum acceptable score (0.0 ..= 1.0).
    pub min_score: f64,

    /// Actions the caller may claim.
    pub allowed_actions: Vec<String>,

    /// Rate limit for this route.
    pub rate_limit: RateLimitConfig,
}

impl Default for CaptchaRouteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret_env: "RECAPTCHA_SECRET_KEY".to_string(),
            verify_url: "https://www.google.com/recaptcha/api/siteverify".to_string(),
            min_score: 0.5,
            allowed_actions: vec!["submit_waitlist".to_string()],
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Subscription route configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubscribeRouteConfig {
    /// Enable the route.
    pub enabled: bool,

    /// Environment variable holding the subscription service API key.
    pub api_key_env: String,

    /// Base URL of the subscription service API.
    pub base_url: String,

    /// Audience (mailing list) ids callers may subscribe to.
    pub allowed_audiences: Vec<String>,

    /// Rate limit for this route.
    pub rate_limit: RateLimitConfig,
}

impl Default for SubscribeRouteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: "RESEND_API_KEY".to_string(),
            base_url: "https://api.resend.com".to_string(),
            allowed_audiences: Vec::new(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Webhook relay route configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookRouteConfig {
    /// Enable the route.
    pub enabled: bool,

    /// Environment variable holding the shared webhook signing secret.
    pub secret_env: String,

    /// Exact target URLs callers may deliver to.
    pub allowed_webhooks: Vec<String>,

    /// Rate limit for this route.
    pub rate_limit: RateLimitConfig,
}

impl Default for WebhookRouteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret_env: "WEBHOOK_SECRET".to_string(),
            allowed_webhooks: Vec::new(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Maximum number of response-body bytes captured per audit entry.
    /// Larger bodies pass through to the client untouched but are truncated
    /// in the log.
    pub max_body_bytes: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 4096,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
