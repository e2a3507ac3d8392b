//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by route, code, status
//! - `gateway_request_duration_seconds` (histogram): inbound latency by route
//! - `gateway_upstream_retries_total` (counter): retries by error code
//! - `gateway_rate_limited_total` (counter): local rate-limit denials by target
//!
//! # Design Decisions
//! - Recording functions are free functions so callers need no handle
//! - The Prometheus listener is optional; without it updates are dropped

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one completed inbound request.
pub fn record_request(route: &'static str, code: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "gateway_requests_total",
        "route" => route,
        "code" => code,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(code: &'static str) {
    ::metrics::counter!("gateway_upstream_retries_total", "code" => code).increment(1);
}

pub fn record_rate_limited(target: &'static str) {
    ::metrics::counter!("gateway_rate_limited_total", "target" => target).increment(1);
}
