//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, path, status
//! - `http_request_duration_seconds` (histogram): latency by method, path
//! - `api_errors_total` (counter): error envelopes by path, business code

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus exporter on the given address.
///
/// Must run inside a Tokio runtime; the scrape endpoint lives on a
/// background task for the process lifetime.
pub fn init(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Record one handled request.
pub fn record_request(method: &str, path: &str, status: u16, started: Instant) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record one error envelope.
pub fn record_api_error(path: &str, code: i32) {
    metrics::counter!(
        "api_errors_total",
        "path" => path.to_string(),
        "code" => code.to_string(),
    )
    .increment(1);
}
