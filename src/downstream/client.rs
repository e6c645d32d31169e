//! HTTP client for the three downstream APIs.
//!
//! Secrets enter outbound requests here and nowhere else, as late as
//! possible in the pipeline. Error strings from this module are safe to
//! relay: credentials travel in the request body or an auth header, which
//! reqwest does not echo into its error display.

use std::time::Duration;

use axum::http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{ConfigError, GatewayConfig};
use crate::gateway::interceptor::RelayResponse;
use crate::secrets::Secret;

/// Signature header attached to forwarded webhook deliveries.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Failure of a downstream call. Maps to HTTP 502 at the gateway boundary.
#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("downstream request timed out")]
    Timeout,

    #[error("downstream request failed: {0}")]
    Transport(String),

    #[error("downstream returned status {0}")]
    Status(u16),

    #[error("downstream returned a malformed response: {0}")]
    Malformed(String),
}

impl DownstreamError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DownstreamError::Timeout
        } else if e.is_decode() {
            DownstreamError::Malformed(e.to_string())
        } else {
            DownstreamError::Transport(e.to_string())
        }
    }
}

/// Verdict returned by the CAPTCHA verification service.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaVerdict {
    pub success: bool,
    pub score: Option<f64>,
    pub action: Option<String>,
    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
}

/// Client for all downstream calls, sharing one connection pool and one
/// bounded timeout.
pub struct DownstreamClient {
    http: reqwest::Client,
    verify_url: String,
    subscribe_base: String,
}

impl DownstreamClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.downstream_secs))
            .user_agent(concat!("waitlist-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            http,
            verify_url: config.captcha.verify_url.clone(),
            subscribe_base: config.subscribe.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Forward a CAPTCHA token for verification. The service speaks
    /// form-encoded `{secret, response}` and answers JSON.
    pub async fn verify_captcha(
        &self,
        secret: &Secret,
        token: &str,
    ) -> Result<CaptchaVerdict, DownstreamError> {
        let params = [("secret", secret.expose()), ("response", token)];
        let response = self
            .http
            .post(&self.verify_url)
            .form(&params)
            .send()
            .await
            .map_err(DownstreamError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(DownstreamError::Status(response.status().as_u16()));
        }

        response
            .json::<CaptchaVerdict>()
            .await
            .map_err(DownstreamError::from_reqwest)
    }

    /// Add a contact to an audience. The downstream reply is relayed to the
    /// caller verbatim, whatever its status.
    pub async fn subscribe_contact(
        &self,
        api_key: &Secret,
        audience_id: &str,
        contact: &serde_json::Value,
    ) -> Result<RelayResponse, DownstreamError> {
        let url = format!("{}/audiences/{}/contacts", self.subscribe_base, audience_id);
        let response = self
            .http
            .post(url)
            .bearer_auth(api_key.expose())
            .json(contact)
            .send()
            .await
            .map_err(DownstreamError::from_reqwest)?;

        Self::relay_from(response).await
    }

    /// Deliver a verified payload to an allow-listed webhook target,
    /// propagating the caller's signature so the receiver can verify too.
    pub async fn forward_webhook(
        &self,
        target_url: &str,
        payload: &[u8],
        signature: &str,
    ) -> Result<RelayResponse, DownstreamError> {
        let response = self
            .http
            .post(target_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(WEBHOOK_SIGNATURE_HEADER, signature)
            .body(payload.to_vec())
            .send()
            .await
            .map_err(DownstreamError::from_reqwest)?;

        Self::relay_from(response).await
    }

    /// Capture status, content type, and body for exact relay.
    async fn relay_from(response: reqwest::Response) -> Result<RelayResponse, DownstreamError> {
        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(DownstreamError::from_reqwest)?;

        Ok(RelayResponse {
            status,
            content_type,
            body,
        })
    }
}
