//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, matched
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_reconciliations_total` (counter): applied pushes by tenant
//! - `gateway_routes_skipped_total` (counter): rejected routes by reason
//! - `gateway_routing_domains` / `gateway_routing_tenants` (gauges)
//! - `gateway_control_plane_connected` (gauge): 1=connected, 0=not
//! - `gateway_control_plane_reconnects_total` (counter)
//! - `gateway_control_plane_decode_failures_total` (counter)
//!
//! Without an installed recorder every call is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::routing::ReconcileReport;

/// Start the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, matched: bool, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("matched", matched.to_string()),
    ];
    metrics::counter!("gateway_requests_total", &labels).increment(1);
    metrics::histogram!("gateway_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_reconcile(report: &ReconcileReport, domains: usize, tenants: usize) {
    metrics::counter!("gateway_reconciliations_total", "tenant" => report.tenant.clone())
        .increment(1);
    for skipped in &report.skipped {
        metrics::counter!("gateway_routes_skipped_total", "reason" => skipped.reason.label())
            .increment(1);
    }
    metrics::gauge!("gateway_routing_domains").set(domains as f64);
    metrics::gauge!("gateway_routing_tenants").set(tenants as f64);
}

pub fn record_control_plane_connected(connected: bool) {
    metrics::gauge!("gateway_control_plane_connected").set(if connected { 1.0 } else { 0.0 });
}

pub fn record_reconnect() {
    metrics::counter!("gateway_control_plane_reconnects_total").increment(1);
}

pub fn record_decode_failure() {
    metrics::counter!("gateway_control_plane_decode_failures_total").increment(1);
}
