//! Proxy gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming POST
//!     → origin check (security/origin.rs)
//!     → rate limiter (security/rate_limit.rs)
//!     → payload parse + security checks (security/validator.rs)
//!     → secret injection (secrets/vault.rs, last possible moment)
//!     → downstream call (downstream/client.rs, bounded timeout)
//!     → ResponseInterceptor (single send + audit capture)
//!     → client
//!
//! Any failure jumps straight to the interceptor's error path; every
//! request is audited exactly once either way.
//! ```

pub mod error;
pub mod handlers;
pub mod interceptor;
pub mod server;

use std::net::IpAddr;
use std::time::Instant;

use axum::http::HeaderMap;

pub use error::GatewayError;
pub use server::GatewayServer;

/// The three proxied routes. Immutable, fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Captcha,
    Subscribe,
    Webhook,
}

impl Route {
    /// HTTP path the route is mounted at.
    pub fn path(self) -> &'static str {
        match self {
            Route::Captcha => "/api/recaptcha-proxy",
            Route::Subscribe => "/api/resend-proxy",
            Route::Webhook => "/api/webhook-proxy",
        }
    }

    /// Short identifier used in rate-limit keys, logs, and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Captcha => "captcha",
            Route::Subscribe => "subscribe",
            Route::Webhook => "webhook",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the caller, used as the rate-limit and audit key.
///
/// Derived from the peer address. Carries no PII beyond what the transport
/// already exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn from_ip(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request context. Owned exclusively by one in-flight request.
#[derive(Debug)]
pub struct ProxyRequestContext {
    pub route: Route,
    pub client: ClientIdentity,
    pub request_id: String,
    /// Env-var name of the secret injected for this route, for the audit
    /// entry (value is never stored here).
    pub secret_ref: Option<String>,
    pub received_at: Instant,
}

impl ProxyRequestContext {
    pub fn new(
        route: Route,
        client: ClientIdentity,
        headers: &HeaderMap,
        secret_ref: Option<String>,
    ) -> Self {
        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self {
            route,
            client,
            request_id,
            secret_ref,
            received_at: Instant::now(),
        }
    }
}
