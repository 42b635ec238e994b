//! Court reservation endpoints.
//!
//! - `POST   /v1/organizations/:org_id/courts/:court_id/reserve`
//! - `GET    /v1/organizations/:org_id/courts/:court_id/reservations?from=..&to=..`
//! - `GET    /v1/organizations/:org_id/courts/:court_id/reservations/:reservation_id`
//! - `DELETE /v1/organizations/:org_id/courts/:court_id/reservations/:reservation_id`
//!
//! The organization segment is validated and logged but does not scope
//! lookups; courts are identified by `court_id` alone.

use crate::WebResult;
use crate::error::AppError;
use crate::state::AppState;
use crate::time::parse_timestamp;
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use courtside_core::{CandidateReservation, CourtId, Reservation, ReservationId, TimeSlot};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to reserve a court.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveCourtRequest {
    /// Start of the window (`YYYY-MM-DDTHH:MM`, with seconds, or RFC 3339)
    pub start_time: Option<String>,
    /// End of the window, exclusive
    pub end_time: Option<String>,
    /// Who is booking
    pub reserved_by: Option<String>,
}

/// Request to cancel a reservation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationRequest {
    /// Who performs the cancellation
    pub cancelled_by: Option<String>,
}

/// Query for listing reservations.
#[derive(Debug, Default, Deserialize)]
pub struct ListReservationsQuery {
    /// Window start
    pub from: Option<String>,
    /// Window end, exclusive
    pub to: Option<String>,
}

/// Reservation as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    /// Reservation ID
    pub id: String,
    /// Court the reservation holds
    pub court_id: String,
    /// `pending`, `reserved` or `cancelled`
    pub status: String,
    /// Window start (UTC)
    pub reserved_from: DateTime<Utc>,
    /// Window end (UTC, exclusive)
    pub reserved_to: DateTime<Utc>,
    /// Who booked
    pub reserved_by: String,
    /// Who cancelled, omitted while live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    /// Creation time (UTC)
    pub created_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        Self {
            id: reservation.id.to_string(),
            court_id: reservation.court_id.to_string(),
            status: reservation.status.as_str().to_string(),
            reserved_from: reservation.reserved_from,
            reserved_to: reservation.reserved_to,
            reserved_by: reservation.reserved_by,
            cancelled_by: reservation.cancelled_by.filter(|by| !by.is_empty()),
            created_at: reservation.created_at,
        }
    }
}

/// Listing response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListReservationsResponse {
    /// Reservations ordered by start
    pub reservations: Vec<ReservationResponse>,
}

// ============================================================================
// Validation helpers
// ============================================================================

fn require_ids(org_id: &str, court_id: &str) -> Result<CourtId, AppError> {
    if org_id.trim().is_empty() || court_id.trim().is_empty() {
        return Err(AppError::bad_request("orgId and courtId are required"));
    }
    Ok(CourtId::new(court_id))
}

/// Parse a required timestamp field, naming it in the error.
fn require_time(field: &str, value: Option<&str>) -> Result<DateTime<Utc>, AppError> {
    match value.map(str::trim) {
        None | Some("") => Err(AppError::bad_request(format!("{field} is required"))),
        Some(raw) => parse_timestamp(raw).map_err(|e| AppError::bad_request(format!("{field}: {e}"))),
    }
}

/// A malformed reservation id cannot name an existing reservation.
fn parse_reservation_id(raw: &str) -> Result<ReservationId, AppError> {
    raw.parse()
        .map_err(|_| AppError::not_found("Reservation", raw))
}

fn window(
    start_field: &str,
    start: Option<&str>,
    end_field: &str,
    end: Option<&str>,
) -> Result<TimeSlot, AppError> {
    let from = require_time(start_field, start)?;
    let to = require_time(end_field, end)?;
    TimeSlot::new(from, to)
        .map_err(|_| AppError::bad_request(format!("{start_field} must be before {end_field}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// Reserve a court for a time window.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/v1/organizations/org-1/courts/court-1/reserve \
///   -H "Content-Type: application/json" \
///   -d '{"startTime": "2025-11-04T18:30", "endTime": "2025-11-04T19:45", "reservedBy": "user-789"}'
/// ```
///
/// 201 with the reservation, 409 `COURT_ALREADY_RESERVED` when the window
/// overlaps a live reservation.
///
/// # Errors
///
/// 400 on malformed input, 409 on conflict, 503 when the court lock wait
/// limit expires, 500 on store failure.
pub async fn reserve_court(
    State(state): State<AppState>,
    Path((org_id, court_id)): Path<(String, String)>,
    body: Result<Json<ReserveCourtRequest>, JsonRejection>,
) -> WebResult<(StatusCode, Json<ReservationResponse>)> {
    let court_id = require_ids(&org_id, &court_id)?;
    let Json(request) = body.map_err(|rejection| {
        tracing::warn!(org_id = %org_id, court_id = %court_id, error = %rejection, "Invalid reserve court body");
        AppError::bad_request("invalid json")
    })?;

    let slot = window(
        "startTime",
        request.start_time.as_deref(),
        "endTime",
        request.end_time.as_deref(),
    )?;

    let candidate = CandidateReservation::new(slot, request.reserved_by.unwrap_or_default());
    let reservation = state.service.reserve_court(court_id, candidate).await?;

    tracing::info!(
        org_id = %org_id,
        court_id = %reservation.court_id,
        reservation_id = %reservation.id,
        slot = %slot,
        "Court reserved"
    );

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

/// List reservations on a court intersecting `[from, to)`, any status.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8080/v1/organizations/org-1/courts/court-1/reservations?from=2025-11-04T00:00&to=2025-11-05T00:00"
/// ```
///
/// # Errors
///
/// 400 when `from`/`to` are missing, malformed or out of order, 500 on
/// store failure.
pub async fn list_reservations(
    State(state): State<AppState>,
    Path((org_id, court_id)): Path<(String, String)>,
    query: Result<Query<ListReservationsQuery>, QueryRejection>,
) -> WebResult<Json<ListReservationsResponse>> {
    let court_id = require_ids(&org_id, &court_id)?;
    let Query(query) = query.map_err(|_| AppError::bad_request("invalid query string"))?;

    let slot = window("from", query.from.as_deref(), "to", query.to.as_deref())?;
    let reservations = state
        .service
        .list_reservations(&court_id, slot.from(), slot.to())
        .await?;

    tracing::debug!(org_id = %org_id, court_id = %court_id, count = reservations.len(), "Listed reservations");

    Ok(Json(ListReservationsResponse {
        reservations: reservations.into_iter().map(Into::into).collect(),
    }))
}

/// Fetch one reservation on a court.
///
/// # Errors
///
/// 404 when the id is malformed, unknown, or belongs to another court.
/// 500 on store failure.
pub async fn get_reservation(
    State(state): State<AppState>,
    Path((org_id, court_id, reservation_id)): Path<(String, String, String)>,
) -> WebResult<Json<ReservationResponse>> {
    let court_id = require_ids(&org_id, &court_id)?;
    let reservation_id = parse_reservation_id(&reservation_id)?;

    let reservation = state
        .service
        .get_reservation(&court_id, reservation_id)
        .await?;

    Ok(Json(reservation.into()))
}

/// Cancel a reservation.
///
/// # Example
///
/// ```bash
/// curl -X DELETE http://localhost:8080/v1/organizations/org-1/courts/court-1/reservations/660e8400-e29b-41d4-a716-446655440001 \
///   -H "Content-Type: application/json" \
///   -d '{"cancelledBy": "front-desk"}'
/// ```
///
/// # Errors
///
/// 400 when `cancelledBy` is missing, 404 when the reservation is unknown or
/// on another court, 409 `ALREADY_CANCELLED` on a repeat, 500 on store failure.
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path((org_id, court_id, reservation_id)): Path<(String, String, String)>,
    body: Result<Json<CancelReservationRequest>, JsonRejection>,
) -> WebResult<Json<ReservationResponse>> {
    let court_id = require_ids(&org_id, &court_id)?;
    let reservation_id = parse_reservation_id(&reservation_id)?;
    let Json(request) = body.map_err(|_| AppError::bad_request("invalid json"))?;

    let cancelled_by = match request.cancelled_by.as_deref().map(str::trim) {
        None | Some("") => return Err(AppError::bad_request("cancelledBy is required")),
        Some(by) => by.to_string(),
    };

    // Scope check: the reservation must live on this court.
    state
        .service
        .get_reservation(&court_id, reservation_id)
        .await?;

    let cancelled = state
        .service
        .cancel_reservation(reservation_id, &cancelled_by)
        .await?;

    tracing::info!(
        org_id = %org_id,
        court_id = %court_id,
        reservation_id = %reservation_id,
        cancelled_by = %cancelled_by,
        "Reservation cancelled"
    );

    Ok(Json(cancelled.into()))
}
