//! Application state for Axum handlers.

use courtside_runtime::ReservationService;
use metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across all HTTP handlers.
///
/// Cheap to clone: the service shares its store, locker and clock.
#[derive(Clone)]
pub struct AppState {
    /// Admission service every reservation route goes through.
    pub service: ReservationService,
    /// Prometheus handle backing `/metrics`, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state around `service` without a metrics route.
    #[must_use]
    pub const fn new(service: ReservationService) -> Self {
        Self {
            service,
            metrics: None,
        }
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
