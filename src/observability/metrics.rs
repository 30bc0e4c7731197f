//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, content kind
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency by content kind
//! - `proxy_upstream_errors_total` (counter): failed fetches by error kind
//! - `proxy_rewritten_references_total` (counter): references wrapped, by content kind
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed proxy request.
pub fn record_request(method: &str, status: u16, content: &'static str, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "content" => content
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "content" => content)
        .record(start.elapsed().as_secs_f64());
}

/// Record a failed upstream fetch.
pub fn record_upstream_error(kind: &'static str) {
    counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}

/// Record references wrapped while rewriting one body.
pub fn record_rewritten_references(content: &'static str, count: usize) {
    if count > 0 {
        counter!("proxy_rewritten_references_total", "content" => content).increment(count as u64);
    }
}
