//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route group
//! - `gateway_request_duration_seconds` (histogram): latency by route group
//! - `gateway_upstream_calls_total` (counter): upstream calls by service, outcome
//! - `gateway_store_operations_total` (counter): store operations by operation, outcome
//!
//! Recording before `init_metrics` is a no-op, so tests never need an exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, group: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "group" => group.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "group" => group.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream(service: &'static str, outcome: &'static str) {
    counter!("gateway_upstream_calls_total", "service" => service, "outcome" => outcome).increment(1);
}

pub fn record_store(operation: &'static str, outcome: &'static str) {
    counter!("gateway_store_operations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}
