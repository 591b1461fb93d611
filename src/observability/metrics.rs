//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_calls_total` (counter): dispatches by service, call
//! - `rpc_transport_total` (counter): requests by transport kind (get, post)
//! - `rpc_call_duration_seconds` (histogram): round trip per instance
//! - `rpc_backend_errors_total` (counter): responses carrying `error`, by service
//! - `rpc_malformed_responses_total` (counter): responses that are not JSON
//! - `rpc_recoveries_total` (counter): bootstrap outcomes (started, refused, failed)
//!
//! # Design Decisions
//! - Recording is always on; without an installed exporter it is a no-op
//! - The Prometheus exporter is optional and bound to its own address

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_call(service: &str, call: &str) {
    counter!("rpc_calls_total", "service" => service.to_string(), "call" => call.to_string()).increment(1);
}

pub fn record_transport(kind: &'static str) {
    counter!("rpc_transport_total", "kind" => kind).increment(1);
}

pub fn record_duration(service: &str, start: Instant) {
    histogram!("rpc_call_duration_seconds", "service" => service.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_backend_error(service: &str) {
    counter!("rpc_backend_errors_total", "service" => service.to_string()).increment(1);
}

pub fn record_malformed_response(service: &str) {
    counter!("rpc_malformed_responses_total", "service" => service.to_string()).increment(1);
}

pub fn record_recovery(outcome: &'static str) {
    counter!("rpc_recoveries_total", "outcome" => outcome).increment(1);
}
