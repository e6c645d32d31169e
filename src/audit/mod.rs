//! Audit logging.
//!
//! Every proxied request produces exactly one structured entry under the
//! `audit` tracing target, on success and on error alike. Entries are built
//! only from redaction-safe inputs: the secret slot carries the env-var
//! name plus the fixed `[REDACTED]` placeholder, never a value. Bodies are
//! truncated at a configured cap so a multi-megabyte downstream reply
//! cannot blow up the log.

use axum::http::StatusCode;

use crate::gateway::ProxyRequestContext;
use crate::secrets::REDACTED;

/// One audited request/response pair.
#[derive(Debug)]
pub struct AuditLogEntry<'a> {
    pub request_id: &'a str,
    pub route: &'static str,
    pub client: &'a str,
    /// `accepted`, a reject reason code, or an error code.
    pub outcome: &'a str,
    /// Status relayed to the client.
    pub status: u16,
    /// Truncated copy of the relayed body.
    pub body_summary: String,
    /// Env-var name of the injected secret, if the route uses one.
    pub secret_ref: Option<&'a str>,
    pub elapsed_ms: u128,
}

/// Structured, secret-redacted sink for proxied request/response pairs.
pub struct AuditSink {
    max_body_bytes: usize,
}

impl AuditSink {
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }

    /// Record one entry. Called exactly once per request by the response
    /// interceptor.
    pub fn record(
        &self,
        ctx: &ProxyRequestContext,
        outcome: &str,
        status: StatusCode,
        body: &[u8],
    ) {
        let entry = AuditLogEntry {
            request_id: &ctx.request_id,
            route: ctx.route.as_str(),
            client: ctx.client.as_str(),
            outcome,
            status: status.as_u16(),
            body_summary: summarize(body, self.max_body_bytes),
            secret_ref: ctx.secret_ref.as_deref(),
            elapsed_ms: ctx.received_at.elapsed().as_millis(),
        };

        tracing::info!(
            target: "audit",
            request_id = %entry.request_id,
            route = %entry.route,
            client = %entry.client,
            outcome = %entry.outcome,
            status = entry.status,
            body = %entry.body_summary,
            secret_ref = entry.secret_ref.unwrap_or("none"),
            secret = %REDACTED,
            elapsed_ms = entry.elapsed_ms,
            "proxied request"
        );
    }
}

/// Lossy UTF-8 copy of the first `cap` bytes, annotated with how much was
/// cut. Large bodies pass through to the client untouched; only the audit
/// copy is truncated.
fn summarize(body: &[u8], cap: usize) -> String {
    if body.len() <= cap {
        String::from_utf8_lossy(body).into_owned()
    } else {
        let mut summary = String::from_utf8_lossy(&body[..cap]).into_owned();
        summary.push_str(&format!(" …(+{} bytes truncated)", body.len() - cap));
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_are_kept_whole() {
        assert_eq!(summarize(b"{\"ok\":true}", 4096), "{\"ok\":true}");
    }

    #[test]
    fn long_bodies_are_truncated_with_marker() {
        let body = vec![b'x'; 5000];
        let summary = summarize(&body, 4096);
        assert!(summary.starts_with("xxxx"));
        assert!(summary.ends_with("…(+904 bytes truncated)"));
    }

    #[test]
    fn invalid_utf8_does_not_panic() {
        let summary = summarize(&[0xff, 0xfe, b'a'], 4096);
        assert!(summary.contains('a'));
    }
}
