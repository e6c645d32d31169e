//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): proxied requests by route, outcome, status
//! - `gateway_throttled_total` (counter): rate-limited rejections by route
//! - `gateway_rejected_total` (counter): security rejections by route, reason

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener. Failures are
/// logged, not fatal: the gateway serves traffic without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }
}

/// One proxied request reached its single exit.
pub fn record_proxied(route: &str, outcome: &str, status: u16) {
    counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "outcome" => outcome.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// A request was stopped by the rate limiter.
pub fn record_throttled(route: &str) {
    counter!("gateway_throttled_total", "route" => route.to_string()).increment(1);
}

/// A request was stopped by a security check.
pub fn record_rejected(route: &str, reason: &str) {
    counter!(
        "gateway_rejected_total",
        "route" => route.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}
