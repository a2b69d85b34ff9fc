//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hostsim_requests_total` (counter): responses by dispatch kind and status
//! - `hostsim_rule_hits_total` (counter): hostname rule applications by rule type
//! - `hostsim_log_rotations_total` (counter): access log archive writes
//! - `hostsim_active_sessions` (gauge): live admin sessions
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus recorder.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(kind: &'static str, status: u16) {
    counter!("hostsim_requests_total", "kind" => kind, "status" => status.to_string()).increment(1);
}

pub fn record_rule_hit(rule_type: &'static str) {
    counter!("hostsim_rule_hits_total", "rule_type" => rule_type).increment(1);
}

pub fn record_log_rotation() {
    counter!("hostsim_log_rotations_total").increment(1);
}

pub fn record_active_sessions(count: usize) {
    gauge!("hostsim_active_sessions").set(count as f64);
}
