//! Response interception: one send, one audit entry.
//!
//! The interceptor owns the act of producing the response. It consumes
//! itself on either exit path, so a second send cannot be expressed, and
//! the audit entry is written before the response value leaves the handler,
//! so logging can never trail partially sent bytes. What the client
//! receives is exactly what the downstream (or the error mapper) produced;
//! only the audit copy is truncated.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::audit::AuditSink;
use crate::gateway::{GatewayError, ProxyRequestContext};
use crate::observability::metrics;

/// A downstream (or gateway-built) response captured for exact relay:
/// status, content type, and the untouched body bytes.
#[derive(Debug)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RelayResponse {
    /// Gateway-owned JSON response (used by the CAPTCHA route, whose
    /// success shape belongs to the gateway).
    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: Bytes::from(value.to_string()),
        }
    }
}

/// Wraps the single send for one request.
pub struct ResponseInterceptor {
    sink: Arc<AuditSink>,
    ctx: ProxyRequestContext,
}

impl ResponseInterceptor {
    pub fn new(sink: Arc<AuditSink>, ctx: ProxyRequestContext) -> Self {
        Self { sink, ctx }
    }

    pub fn context(&self) -> &ProxyRequestContext {
        &self.ctx
    }

    /// Relay an accepted response to the client, auditing it first.
    /// Consumes the interceptor: there is no second send.
    pub fn relay(self, relay: RelayResponse) -> Response {
        self.sink
            .record(&self.ctx, "accepted", relay.status, &relay.body);
        metrics::record_proxied(self.ctx.route.as_str(), "accepted", relay.status.as_u16());

        let mut response = (relay.status, relay.body).into_response();
        let content_type = relay
            .content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
            .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
        response
    }

    /// Normalize a failure into the error wire shape, auditing it first.
    pub fn reject(self, error: GatewayError) -> Response {
        if let GatewayError::Rejected(reason) = &error {
            metrics::record_rejected(self.ctx.route.as_str(), reason.as_str());
        }
        if matches!(error, GatewayError::Internal(_)) {
            // Full context server-side; the client sees a generic line.
            tracing::error!(
                request_id = %self.ctx.request_id,
                route = %self.ctx.route,
                error = %error,
                "Unexpected gateway fault"
            );
        }

        let body = error.to_body().to_string();
        self.sink
            .record(&self.ctx, error.code(), error.status(), body.as_bytes());
        metrics::record_proxied(self.ctx.route.as_str(), error.code(), error.status().as_u16());

        error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ClientIdentity, Route};
    use axum::http::HeaderMap;
    use std::net::{IpAddr, Ipv4Addr};

    fn interceptor() -> ResponseInterceptor {
        let ctx = ProxyRequestContext::new(
            Route::Captcha,
            ClientIdentity::from_ip(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            &HeaderMap::new(),
            Some("RECAPTCHA_SECRET_KEY".to_string()),
        );
        ResponseInterceptor::new(Arc::new(AuditSink::new(4096)), ctx)
    }

    #[test]
    fn relay_preserves_status_and_content_type() {
        let response = interceptor().relay(RelayResponse {
            status: StatusCode::CREATED,
            content_type: Some("application/json".to_string()),
            body: Bytes::from_static(b"{\"id\":\"c_1\"}"),
        });
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn reject_produces_error_wire_shape() {
        let response = interceptor().reject(GatewayError::Throttled { retry_after_secs: 3 });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }
}
