//! Error types for reservation admission.
//!
//! [`BookingError`] is what the service returns to callers. Every variant
//! maps to exactly one [`ErrorKind`], which boundary layers use to pick a
//! status code without matching on individual variants.

use crate::types::{CourtId, ReservationId, TimeSlot};
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Result alias for admission operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Coarse classification of a [`BookingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The requested slot collides with an existing reservation.
    Conflict,
    /// The referenced reservation does not exist.
    NotFound,
    /// The reservation exists but the operation is not allowed in its status.
    InvalidState,
    /// The request itself is malformed.
    InvalidInput,
    /// Storage or locking failed.
    Infrastructure,
}

/// Errors returned by the admission service.
#[derive(Error, Debug)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Admission Errors
    // ═══════════════════════════════════════════════════════════
    /// Another non-cancelled reservation on the court overlaps the slot.
    #[error("court {court_id} is already reserved for {slot}")]
    CourtAlreadyReserved {
        /// Court that was requested.
        court_id: CourtId,
        /// Slot that was requested.
        slot: TimeSlot,
    },

    /// Slot is empty or inverted.
    #[error("invalid time slot: from {from} must be before to {to}")]
    InvalidTimeSlot {
        /// Requested start.
        from: DateTime<Utc>,
        /// Requested end.
        to: DateTime<Utc>,
    },

    // ═══════════════════════════════════════════════════════════
    // Lifecycle Errors
    // ═══════════════════════════════════════════════════════════
    /// No reservation has the given identifier.
    #[error("reservation {reservation_id} not found")]
    ReservationNotFound {
        /// Identifier that was looked up.
        reservation_id: ReservationId,
    },

    /// Cancellation of a reservation that is already cancelled.
    #[error("reservation {reservation_id} is already cancelled")]
    AlreadyCancelled {
        /// Identifier of the cancelled reservation.
        reservation_id: ReservationId,
    },

    // ═══════════════════════════════════════════════════════════
    // Infrastructure Errors
    // ═══════════════════════════════════════════════════════════
    /// A store operation failed.
    #[error("store operation '{operation}' failed{}: {source}", for_court(.court_id.as_ref()))]
    Store {
        /// Store method that failed (`create`, `find_overlapping`, ...).
        operation: &'static str,
        /// Court the operation concerned, when known before the lookup.
        court_id: Option<CourtId>,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// Acquiring or releasing the court lock failed.
    #[error("lock for court {court_id} failed: {source}")]
    Lock {
        /// Court whose lock failed.
        court_id: CourtId,
        /// Underlying lock error.
        #[source]
        source: LockError,
    },
}

fn for_court(court_id: Option<&CourtId>) -> String {
    court_id.map_or_else(String::new, |court_id| format!(" for court {court_id}"))
}

impl BookingError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CourtAlreadyReserved { .. } => ErrorKind::Conflict,
            Self::ReservationNotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyCancelled { .. } => ErrorKind::InvalidState,
            Self::InvalidTimeSlot { .. } => ErrorKind::InvalidInput,
            Self::Store { .. } | Self::Lock { .. } => ErrorKind::Infrastructure,
        }
    }

    /// Check if this error is caused by the caller (4xx) vs the system (5xx).
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Infrastructure)
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Only infrastructure failures are retryable. A conflict is not: the
    /// slot stays taken until someone cancels.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Infrastructure)
    }
}

/// Errors raised by a [`ReservationStore`](crate::ReservationStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with the given identifier.
    #[error("reservation {0} not found")]
    NotFound(ReservationId),

    /// Cancel hit a record that is already cancelled.
    #[error("reservation {0} is already cancelled")]
    AlreadyCancelled(ReservationId),

    /// The backing database reported an error.
    #[error("database error: {0}")]
    Database(String),

    /// A stored row could not be turned back into a reservation.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Errors raised by a resource locker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The lock was not obtained within the configured wait limit.
    #[error("timed out after {waited:?} waiting for lock")]
    Timeout {
        /// How long the caller waited.
        waited: Duration,
    },

    /// Release was requested for a key with no lock entry.
    #[error("no lock found for key {key}")]
    NotHeld {
        /// Key that was released.
        key: CourtId,
    },

    /// Release was requested with a handle issued by a different locker.
    #[error("lock handle was issued by a different locker")]
    ForeignHandle,
}
