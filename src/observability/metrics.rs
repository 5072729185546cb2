//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ledger_calls_total` (counter): node calls by operation and outcome
//! - `workflow_runs_total` (counter): workflow runs by workflow and outcome
//!
//! Outcomes are `ok`, an error kind (`transport`, `server`,
//! `precondition`), or for workflows `failed_<stage>`.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_ledger_call(operation: &'static str, outcome: &str) {
    ::metrics::counter!(
        "ledger_calls_total",
        "operation" => operation,
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_workflow_run(workflow: &'static str, outcome: String) {
    ::metrics::counter!(
        "workflow_runs_total",
        "workflow" => workflow,
        "outcome" => outcome
    )
    .increment(1);
}
