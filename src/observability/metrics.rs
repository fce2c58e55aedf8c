//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hit_counter_requests_total` (counter): proxy invocations by outcome
//! - `hit_counter_request_duration_seconds` (histogram): end-to-end proxy latency
//! - `hit_counter_store_errors_total` (counter): failed store operations by operation
//! - `hit_counter_downstream_duration_seconds` (histogram): downstream call latency
//! - `hit_counter_tracked_paths` (gauge): distinct paths in the counter table
//!
//! Without an installed recorder every call here is a no-op, which keeps
//! unit tests free of global setup.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);

    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus recorder"),
    }
}

/// Record one proxy invocation.
pub fn record_request(outcome: &'static str, start: Instant) {
    counter!("hit_counter_requests_total", "outcome" => outcome).increment(1);
    histogram!("hit_counter_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a failed store operation.
pub fn record_store_error(operation: &'static str) {
    counter!("hit_counter_store_errors_total", "operation" => operation).increment(1);
}

/// Record the latency of one downstream call.
pub fn record_downstream(start: Instant) {
    histogram!("hit_counter_downstream_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_tracked_paths(count: usize) {
    gauge!("hit_counter_tracked_paths").set(count as f64);
}
