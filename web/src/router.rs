//! Route table.

use crate::handlers::{health, reservations};
use crate::middleware::with_request_tracing;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Build the full application router.
///
/// ```text
/// GET    /health
/// GET    /metrics
/// POST   /v1/organizations/:org_id/courts/:court_id/reserve
/// POST   /v1/organizations/:org_id/courts/:court_id/reservations
/// GET    /v1/organizations/:org_id/courts/:court_id/reservations
/// GET    /v1/organizations/:org_id/courts/:court_id/reservations/:reservation_id
/// DELETE /v1/organizations/:org_id/courts/:court_id/reservations/:reservation_id
/// ```
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route(
            "/v1/organizations/:org_id/courts/:court_id/reserve",
            post(reservations::reserve_court),
        )
        .route(
            "/v1/organizations/:org_id/courts/:court_id/reservations",
            get(reservations::list_reservations).post(reservations::reserve_court),
        )
        .route(
            "/v1/organizations/:org_id/courts/:court_id/reservations/:reservation_id",
            get(reservations::get_reservation).delete(reservations::cancel_reservation),
        )
        .with_state(state);

    with_request_tracing(api)
}
