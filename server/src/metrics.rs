//! Business metrics for the eventreg service.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `eventreg_registrations_total{outcome}` - Register attempts by outcome
//! - `eventreg_cancellations_total{outcome}` - Cancel attempts by outcome
//! - `eventreg_confirmations_total{outcome}` - Confirm attempts by outcome
//! - `eventreg_events_created_total` - Events created
//!
//! `outcome` is `success` or the error label (`capacity_exceeded`,
//! `already_registered`, `deadline_exceeded`, ...).

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The configured address is not a socket address
    #[error("Invalid metrics address {0:?}")]
    Address(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "eventreg_registrations_total",
        "Total number of registration attempts by outcome"
    );
    describe_counter!(
        "eventreg_cancellations_total",
        "Total number of cancellation attempts by outcome"
    );
    describe_counter!(
        "eventreg_confirmations_total",
        "Total number of confirmation attempts by outcome"
    );
    describe_counter!(
        "eventreg_events_created_total",
        "Total number of events created"
    );

    tracing::info!("Business metrics registered");
}

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// An already installed recorder (e.g. in tests) is left in place.
///
/// # Errors
///
/// Returns [`MetricsError`] if `addr` does not parse or the exporter cannot
/// be installed.
pub fn install_exporter(addr: &str) -> Result<(), MetricsError> {
    let socket: SocketAddr = addr
        .parse()
        .map_err(|_| MetricsError::Address(addr.to_string()))?;

    match PrometheusBuilder::new().with_http_listener(socket).install() {
        Ok(()) => {
            tracing::info!(
                addr = %socket,
                "Metrics server started - available at http://{}/metrics",
                socket
            );
            Ok(())
        }
        Err(e) => {
            let err_msg = e.to_string();
            if err_msg.contains("already initialized") {
                tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                Ok(())
            } else {
                Err(MetricsError::Install(err_msg))
            }
        }
    }
}
