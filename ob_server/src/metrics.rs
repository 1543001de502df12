//! Prometheus metrics for the tournament server.
//!
//! Metrics are exported on a dedicated listener (see `--metrics-bind`) in
//! Prometheus text format.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter on `addr`; scrape at
/// `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install Prometheus exporter: {e}"))
}

/// Count an HTTP request by method, path and status code.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
}

/// Count bracket generations by format.
pub fn brackets_generated_total(format: &str) {
    metrics::counter!(
        "brackets_generated_total",
        "format" => format.to_string(),
    )
    .increment(1);
}

/// Count recorded match results by format.
pub fn match_results_total(format: &str) {
    metrics::counter!(
        "match_results_total",
        "format" => format.to_string(),
    )
    .increment(1);
}
