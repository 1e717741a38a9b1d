//! Metrics collection and exposition.
//!
//! # Metrics
//! - `alarms_requests_total` (counter): alarm requests by result
//!   (`sent`, `json-parse`, `validate`, `invalid-token`, `mail`)
//! - `alarms_mail_failures_total` (counter): SMTP delivery failures
//!
//! Without an installed recorder the macros are no-ops, so handlers record
//! unconditionally.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count one alarm request.
pub fn record_alarm(result: &str) {
    ::metrics::counter!("alarms_requests_total", "result" => result.to_string()).increment(1);
}

/// Count one failed delivery.
pub fn record_mail_failure() {
    ::metrics::counter!("alarms_mail_failures_total").increment(1);
}
