//! Route handlers.
//!
//! Each handler builds the request context, hands it to a
//! [`ResponseInterceptor`], and runs the pipeline: origin check, rate
//! limit, payload parse, security checks, secret injection, downstream
//! call. Failures at any stage land in the interceptor's error path, so
//! every request is answered and audited exactly once.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::RateLimitConfig;
use crate::gateway::interceptor::{RelayResponse, ResponseInterceptor};
use crate::gateway::server::AppState;
use crate::gateway::{ClientIdentity, GatewayError, ProxyRequestContext, Route};
use crate::secrets::Secret;
use crate::security::origin::check_origin;
use crate::security::validator;
use crate::security::{RateDecision, SecurityDecision};

/// CAPTCHA verification request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaRequest {
    pub token: String,
    pub action: String,
    #[serde(default)]
    pub honeypot: Option<String>,
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
}

/// Subscription request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub email: String,
    pub audience_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    pub honeypot: Option<String>,
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
}

/// Webhook relay request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub url: String,
    pub payload: Value,
    pub signature: String,
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn recaptcha_proxy(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = ProxyRequestContext::new(
        Route::Captcha,
        ClientIdentity::from_ip(addr.ip()),
        &headers,
        Some(state.config.captcha.secret_env.clone()),
    );
    let interceptor = ResponseInterceptor::new(state.audit.clone(), ctx);
    let outcome = handle_captcha(&state, interceptor.context(), &headers, &body).await;
    match outcome {
        Ok(relay) => interceptor.relay(relay),
        Err(error) => interceptor.reject(error),
    }
}

async fn handle_captcha(
    state: &AppState,
    ctx: &ProxyRequestContext,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<RelayResponse, GatewayError> {
    let cfg = &state.config.captcha;

    check_origin(headers, &state.config.cors.allowed_origins)?;
    throttle(state, ctx, &cfg.rate_limit)?;

    let request: CaptchaRequest = parse_json(body)?;
    accept(validator::check_honeypot(request.honeypot.as_deref()))?;
    accept(validator::check_timing(
        request.elapsed_ms,
        state.config.security.min_submission_ms,
    ))?;
    // Claimed action is checked locally before spending a downstream call;
    // the verdict's action is checked again below.
    if !cfg.allowed_actions.iter().any(|a| a == &request.action) {
        return Err(GatewayError::Rejected(
            crate::security::RejectReason::DisallowedAction,
        ));
    }

    let secret = route_secret(state, &cfg.secret_env)?;
    let verdict = state.downstream.verify_captcha(secret, &request.token).await?;

    if !verdict.success {
        return Err(GatewayError::BadRequest(format!(
            "captcha verification failed: {}",
            verdict.error_codes.join(", ")
        )));
    }
    accept(validator::evaluate_captcha(
        &verdict,
        cfg.min_score,
        &cfg.allowed_actions,
    ))?;

    Ok(RelayResponse::json(
        StatusCode::OK,
        &json!({
            "success": true,
            "score": verdict.score,
            "action": verdict.action,
        }),
    ))
}

pub async fn resend_proxy(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = ProxyRequestContext::new(
        Route::Subscribe,
        ClientIdentity::from_ip(addr.ip()),
        &headers,
        Some(state.config.subscribe.api_key_env.clone()),
    );
    let interceptor = ResponseInterceptor::new(state.audit.clone(), ctx);
    let outcome = handle_subscribe(&state, interceptor.context(), &headers, &body).await;
    match outcome {
        Ok(relay) => interceptor.relay(relay),
        Err(error) => interceptor.reject(error),
    }
}

async fn handle_subscribe(
    state: &AppState,
    ctx: &ProxyRequestContext,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<RelayResponse, GatewayError> {
    let cfg = &state.config.subscribe;

    check_origin(headers, &state.config.cors.allowed_origins)?;
    throttle(state, ctx, &cfg.rate_limit)?;

    let request: SubscribeRequest = parse_json(body)?;
    accept(validator::check_honeypot(request.honeypot.as_deref()))?;
    accept(validator::check_timing(
        request.elapsed_ms,
        state.config.security.min_submission_ms,
    ))?;
    accept(validator::check_audience(
        &request.audience_id,
        &cfg.allowed_audiences,
    ))?;

    let mut contact = serde_json::Map::new();
    contact.insert("email".to_string(), Value::String(request.email));
    if let Some(first_name) = request.first_name {
        contact.insert("first_name".to_string(), Value::String(first_name));
    }
    if let Some(last_name) = request.last_name {
        contact.insert("last_name".to_string(), Value::String(last_name));
    }
    if let Some(metadata) = request.metadata {
        contact.extend(metadata);
    }

    let api_key = route_secret(state, &cfg.api_key_env)?;
    let relay = state
        .downstream
        .subscribe_contact(api_key, &request.audience_id, &Value::Object(contact))
        .await?;
    Ok(relay)
}

pub async fn webhook_proxy(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = ProxyRequestContext::new(
        Route::Webhook,
        ClientIdentity::from_ip(addr.ip()),
        &headers,
        Some(state.config.webhook.secret_env.clone()),
    );
    let interceptor = ResponseInterceptor::new(state.audit.clone(), ctx);
    let outcome = handle_webhook(&state, interceptor.context(), &headers, &body).await;
    match outcome {
        Ok(relay) => interceptor.relay(relay),
        Err(error) => interceptor.reject(error),
    }
}

async fn handle_webhook(
    state: &AppState,
    ctx: &ProxyRequestContext,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<RelayResponse, GatewayError> {
    let cfg = &state.config.webhook;

    check_origin(headers, &state.config.cors.allowed_origins)?;
    throttle(state, ctx, &cfg.rate_limit)?;

    let request: WebhookRequest = parse_json(body)?;
    accept(validator::check_webhook_url(
        &request.url,
        &cfg.allowed_webhooks,
    ))?;

    let payload = serde_json::to_vec(&request.payload)
        .map_err(|e| GatewayError::Internal(format!("payload re-serialization failed: {e}")))?;
    let secret = route_secret(state, &cfg.secret_env)?;
    accept(validator::verify_webhook_signature(
        secret,
        &payload,
        &request.signature,
    ))?;

    let relay = state
        .downstream
        .forward_webhook(&request.url, &payload, &request.signature)
        .await?;
    Ok(relay)
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, GatewayError> {
    serde_json::from_slice(body).map_err(|e| GatewayError::BadRequest(e.to_string()))
}

fn accept(decision: SecurityDecision) -> Result<(), GatewayError> {
    match decision.rejection() {
        None => Ok(()),
        Some(reason) => Err(GatewayError::Rejected(reason)),
    }
}

/// Throttled requests stop here: they never reach the validator, the
/// vault, or the downstream API.
fn throttle(
    state: &AppState,
    ctx: &ProxyRequestContext,
    limit: &RateLimitConfig,
) -> Result<(), GatewayError> {
    match state.limiter.check(&ctx.client, ctx.route, limit) {
        RateDecision::Allowed => Ok(()),
        RateDecision::Throttled { retry_after_secs } => {
            tracing::warn!(
                client = %ctx.client,
                route = %ctx.route,
                retry_after_secs,
                "Rate limit exceeded"
            );
            Err(GatewayError::Throttled { retry_after_secs })
        }
    }
}

/// Secrets were resolved at startup; a miss here is a gateway bug, not a
/// caller problem.
fn route_secret<'a>(state: &'a AppState, env_ref: &str) -> Result<&'a Secret, GatewayError> {
    state
        .vault
        .get(env_ref)
        .ok_or_else(|| GatewayError::Internal(format!("secret ref `{env_ref}` was not resolved")))
}
