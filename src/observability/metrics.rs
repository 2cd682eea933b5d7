//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_upstream_requests_total` (counter): outbound calls by endpoint, outcome
//! - `gateway_upstream_duration_seconds` (histogram): outbound call latency
//! - `gateway_rejected_requests_total` (counter): interceptor rejections by reason

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one outbound call. `outcome` is the upstream status code or `"error"`.
pub fn record_upstream(endpoint: &'static str, outcome: &str, start: Instant) {
    counter!(
        "gateway_upstream_requests_total",
        "endpoint" => endpoint,
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("gateway_upstream_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejected(reason: &'static str) {
    counter!("gateway_rejected_requests_total", "reason" => reason).increment(1);
}
