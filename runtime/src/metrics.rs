//! Prometheus metrics for reservation admission.
//!
//! The admission service records through the `metrics` facade. Installing
//! the recorder is the binary's job:
//!
//! ```rust,no_run
//! use courtside_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Scrape output for a `/metrics` route
//! let body = server.render().unwrap_or_default();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder plus the address its scrape route is served on.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address the scrape endpoint is served on (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the scrape endpoint should bind to.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Describe all metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., by another test), this logs a
    /// warning and leaves [`handle`](Self::handle) empty.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(
                    addr = %self.addr,
                    "Metrics recorder installed - available at http://{}/metrics",
                    self.addr
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

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the recorder wasn't installed by this server.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "reservations_admitted_total",
        "Total number of reservations admitted and persisted"
    );
    describe_counter!(
        "reservations_rejected_total",
        "Total number of reservation attempts rejected for overlapping an existing reservation"
    );
    describe_counter!(
        "reservations_failed_total",
        "Total number of reservation operations that failed on infrastructure, by operation"
    );
    describe_counter!(
        "reservations_cancelled_total",
        "Total number of reservations cancelled"
    );
    describe_histogram!(
        "reservation_lock_wait_duration_seconds",
        "Time spent waiting for a court lock"
    );
    describe_counter!(
        "reservation_lock_timeouts_total",
        "Total number of court lock acquisitions that hit the wait limit"
    );
    describe_histogram!(
        "reservation_store_query_duration_seconds",
        "Reservation store query latency, by operation"
    );
}

/// Admission metrics recorder.
pub struct AdmissionMetrics;

impl AdmissionMetrics {
    /// Record an admitted reservation.
    pub fn record_admitted() {
        counter!("reservations_admitted_total").increment(1);
    }

    /// Record a rejection due to overlap.
    pub fn record_rejected() {
        counter!("reservations_rejected_total").increment(1);
    }

    /// Record an infrastructure failure of `operation`.
    pub fn record_failure(operation: &'static str) {
        counter!("reservations_failed_total", "operation" => operation).increment(1);
    }

    /// Record a cancellation.
    pub fn record_cancelled() {
        counter!("reservations_cancelled_total").increment(1);
    }
}

/// Court lock metrics recorder.
pub struct LockMetrics;

impl LockMetrics {
    /// Record how long acquiring a court lock took.
    pub fn record_wait(duration: Duration) {
        histogram!("reservation_lock_wait_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a lock wait that hit its limit.
    pub fn record_timeout() {
        counter!("reservation_lock_timeouts_total").increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_metrics_server_creation() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
        assert_eq!(server.addr(), addr);
    }

    #[test]
    fn test_admission_metrics_render() {
        let mut server = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        server.start().unwrap();

        AdmissionMetrics::record_admitted();
        AdmissionMetrics::record_rejected();
        AdmissionMetrics::record_failure("create");
        LockMetrics::record_wait(Duration::from_millis(3));

        // Another test may have installed the recorder first; metrics are
        // still recorded, there is just nothing to render here.
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("reservations_admitted_total"));
            assert!(rendered.contains("reservations_rejected_total"));
            assert!(rendered.contains("operation=\"create\""));
            assert!(rendered.contains("reservation_lock_wait_duration_seconds"));
        }
    }
}
