//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by proxy and status
//! - `proxy_upstream_latency_seconds` (histogram): time to response headers
//! - `proxy_relayed_bytes_total` (counter): body bytes streamed to clients
//! - `proxy_html_injections_total` (counter): documents rewritten
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are low-cardinality; target URLs never become labels

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished handler invocation.
pub fn record_request(proxy: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "proxy" => proxy,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_upstream_latency_seconds", "proxy" => proxy)
        .record(start.elapsed().as_secs_f64());
}

/// Record body bytes relayed to a client.
pub fn record_relayed(proxy: &'static str, bytes: u64) {
    metrics::counter!("proxy_relayed_bytes_total", "proxy" => proxy).increment(bytes);
}

/// Record one resizer script injection.
pub fn record_injection() {
    metrics::counter!("proxy_html_injections_total").increment(1);
}
