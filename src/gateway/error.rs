//! Gateway error taxonomy and wire mapping.
//!
//! Expected conditions (throttling, security rejection) arrive here as
//! values and map to 4xx. Downstream transport failures map to 502.
//! Anything unexpected becomes a 500 with a generic client message; the
//! detail is logged server-side only.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::downstream::DownstreamError;
use crate::security::RejectReason;

/// Client-visible failure of a proxied request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed or incomplete payload. 400.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// `Origin` header present but not allow-listed. 403.
    #[error("origin not allowed: {0}")]
    OriginDenied(String),

    /// Rate limit exceeded. 429 with a Retry-After hint.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    Throttled { retry_after_secs: u64 },

    /// Security validation rejected the request. 403.
    #[error("request rejected: {0}")]
    Rejected(RejectReason),

    /// The third-party API failed or timed out. 502.
    #[error("downstream failure: {0}")]
    Downstream(String),

    /// Unexpected fault inside the gateway. 500, generic message.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::OriginDenied(_) | GatewayError::Rejected(_) => StatusCode::FORBIDDEN,
            GatewayError::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Downstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::BadRequest(_) => "invalid_request",
            GatewayError::OriginDenied(_) => "origin_not_allowed",
            GatewayError::Throttled { .. } => "rate_limited",
            GatewayError::Rejected(reason) => reason.as_str(),
            GatewayError::Downstream(_) => "downstream_error",
            GatewayError::Internal(_) => "internal_error",
        }
    }

    /// Message for the response body. Internal detail never leaves the
    /// process; callers get a generic line instead of a stack trace.
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Serialize to the `{error, message}` wire shape.
    pub fn to_body(&self) -> serde_json::Value {
        json!({
            "error": self.code(),
            "message": self.client_message(),
        })
    }
}

impl From<DownstreamError> for GatewayError {
    fn from(e: DownstreamError) -> Self {
        GatewayError::Downstream(e.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.to_body())).into_response();
        if let GatewayError::Throttled { retry_after_secs } = self {
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
