//! Error types for web handlers.
//!
//! [`AppError`] bridges [`BookingError`] and HTTP responses. It implements
//! Axum's `IntoResponse`, so handlers can return `Result<_, AppError>` and
//! use `?` on service calls.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use courtside_core::{BookingError, LockError};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Reservation>, AppError> {
///     let reservation = state.service.get_reservation(&court_id, id).await?;
///     Ok(Json(reservation))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status this error responds with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error with a specific code.
    #[must_use]
    pub fn conflict(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), code.into())
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Map admission outcomes onto HTTP semantics.
///
/// Infrastructure details stay in the logged source; clients only see a
/// generic message for 5xx responses.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match &err {
            BookingError::CourtAlreadyReserved { .. } => {
                Self::conflict(err.to_string(), "COURT_ALREADY_RESERVED")
            }
            BookingError::AlreadyCancelled { .. } => {
                Self::conflict(err.to_string(), "ALREADY_CANCELLED")
            }
            BookingError::ReservationNotFound { reservation_id } => {
                Self::not_found("Reservation", reservation_id)
            }
            BookingError::InvalidTimeSlot { .. } => Self::bad_request(err.to_string()),
            BookingError::Lock {
                source: LockError::Timeout { .. },
                ..
            } => Self::unavailable("Court is busy, try again").with_source(anyhow::Error::new(err)),
            BookingError::Store { .. } | BookingError::Lock { .. } => {
                Self::internal("An internal error occurred").with_source(anyhow::Error::new(err))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use courtside_core::{CourtId, ReservationId, StoreError, TimeSlot};
    use std::error::Error as _;

    fn slot() -> TimeSlot {
        let from = DateTime::<Utc>::UNIX_EPOCH;
        TimeSlot::new(from, from + Duration::hours(1)).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_not_found() {
        let err = AppError::not_found("Reservation", "123");
        assert_eq!(err.to_string(), "[NOT_FOUND] Reservation with id 123 not found");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let err = AppError::from(BookingError::CourtAlreadyReserved {
            court_id: CourtId::new("court-1"),
            slot: slot(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "COURT_ALREADY_RESERVED");
    }

    #[test]
    fn test_already_cancelled_maps_to_409() {
        let err = AppError::from(BookingError::AlreadyCancelled {
            reservation_id: ReservationId::new(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "ALREADY_CANCELLED");
    }

    #[test]
    fn test_missing_reservation_maps_to_404() {
        let reservation_id = ReservationId::new();
        let err = AppError::from(BookingError::ReservationNotFound { reservation_id });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains(&reservation_id.to_string()));
    }

    #[test]
    fn test_lock_timeout_maps_to_503() {
        let err = AppError::from(BookingError::Lock {
            court_id: CourtId::new("court-1"),
            source: LockError::Timeout {
                waited: std::time::Duration::from_millis(5),
            },
        });
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_store_failure_hides_details() {
        let err = AppError::from(BookingError::Store {
            operation: "create",
            court_id: Some(CourtId::new("court-1")),
            source: StoreError::Database("connection reset".to_string()),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("connection reset"));
        assert!(err.source().is_some());
    }
}
