//! Domain types for court reservations.
//!
//! Identifiers, the half-open [`TimeSlot`] interval, the persisted
//! [`Reservation`] record and the [`CandidateReservation`] a caller submits
//! for admission.

use crate::error::{BookingError, StoreError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque identifier of a bookable court.
///
/// The court itself is owned by an external catalogue; admission only uses
/// the identifier as a lock key and a query filter.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourtId(String);

impl CourtId {
    /// Create a court identifier from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CourtId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CourtId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unique identifier for a reservation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// Creates a new random `ReservationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ReservationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReservationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ============================================================================
// Status
// ============================================================================

/// Lifecycle status of a reservation.
///
/// ```text
/// Pending ──┐
///           ├──► Cancelled (terminal)
/// Reserved ─┘
/// ```
///
/// Records are written with whatever status the caller supplied; the only
/// transition the service drives is into `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Submitted but not yet confirmed by an upstream flow.
    Pending,
    /// Confirmed booking.
    #[default]
    Reserved,
    /// Released; the slot is available again.
    Cancelled,
}

impl ReservationStatus {
    /// Convert status to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reserved => "reserved",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse status from database string.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "reserved" => Ok(Self::Reserved),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(StoreError::Decode(format!(
                "Invalid reservation status: {s}"
            ))),
        }
    }

    /// Whether a reservation in this status still occupies its slot.
    #[must_use]
    pub const fn holds_slot(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Interval
// ============================================================================

/// Half-open time interval `[from, to)` with `from < to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeSlot {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl TimeSlot {
    /// Create a slot, rejecting empty or inverted intervals.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidTimeSlot`] when `from >= to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, BookingError> {
        if from < to {
            Ok(Self { from, to })
        } else {
            Err(BookingError::InvalidTimeSlot { from, to })
        }
    }

    /// Inclusive start.
    #[must_use]
    pub const fn from(&self) -> DateTime<Utc> {
        self.from
    }

    /// Exclusive end.
    #[must_use]
    pub const fn to(&self) -> DateTime<Utc> {
        self.to
    }

    /// Length of the slot.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.to - self.from
    }

    /// Half-open intersection test.
    ///
    /// `[9:00, 10:00)` and `[10:00, 11:00)` share only a boundary and do not
    /// overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.from < other.to && other.from < self.to
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from.to_rfc3339(), self.to.to_rfc3339())
    }
}

// ============================================================================
// Records
// ============================================================================

/// A persisted reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique identifier, assigned at admission time.
    pub id: ReservationId,
    /// Court being reserved.
    pub court_id: CourtId,
    /// Current status.
    pub status: ReservationStatus,
    /// Inclusive start of the reserved window.
    pub reserved_from: DateTime<Utc>,
    /// Exclusive end of the reserved window.
    pub reserved_to: DateTime<Utc>,
    /// Who booked. Empty when the boundary carries no identity.
    pub reserved_by: String,
    /// Who cancelled, set only by cancellation.
    pub cancelled_by: Option<String>,
    /// Creation timestamp, immutable after insert.
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// The reserved window as a [`TimeSlot`].
    ///
    /// Stored records always satisfy `from < to`; the slot is built without
    /// re-validation.
    #[must_use]
    pub const fn slot(&self) -> TimeSlot {
        TimeSlot {
            from: self.reserved_from,
            to: self.reserved_to,
        }
    }

    /// Whether this reservation has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.status == ReservationStatus::Cancelled
    }

    /// Whether this record blocks `slot` on `court_id`.
    #[must_use]
    pub fn blocks(&self, court_id: &CourtId, slot: &TimeSlot) -> bool {
        self.status.holds_slot() && &self.court_id == court_id && self.slot().overlaps(slot)
    }
}

/// A reservation attempt submitted for admission.
///
/// The court is supplied separately as the lock key. Identity and creation
/// time are assigned by the service unless pre-set here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReservation {
    /// Requested window.
    pub slot: TimeSlot,
    /// Who is booking.
    pub reserved_by: String,
    /// Status to persist. Defaults to [`ReservationStatus::Reserved`].
    pub status: ReservationStatus,
    /// Pre-assigned identifier.
    pub id: Option<ReservationId>,
    /// Pre-assigned creation time.
    pub created_at: Option<DateTime<Utc>>,
}

impl CandidateReservation {
    /// Create a candidate for `slot` booked by `reserved_by`.
    #[must_use]
    pub fn new(slot: TimeSlot, reserved_by: impl Into<String>) -> Self {
        Self {
            slot,
            reserved_by: reserved_by.into(),
            status: ReservationStatus::Reserved,
            id: None,
            created_at: None,
        }
    }

    /// Set the status to persist.
    #[must_use]
    pub const fn with_status(mut self, status: ReservationStatus) -> Self {
        self.status = status;
        self
    }

    /// Use a caller-chosen identifier instead of a generated one.
    #[must_use]
    pub const fn with_id(mut self, id: ReservationId) -> Self {
        self.id = Some(id);
        self
    }

    /// Use a caller-chosen creation time instead of the clock.
    #[must_use]
    pub const fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Build the record to persist, filling identity and creation time.
    #[must_use]
    pub fn into_reservation(self, court_id: CourtId, now: DateTime<Utc>) -> Reservation {
        Reservation {
            id: self.id.unwrap_or_default(),
            court_id,
            status: self.status,
            reserved_from: self.slot.from,
            reserved_to: self.slot.to,
            reserved_by: self.reserved_by,
            cancelled_by: None,
            created_at: self.created_at.unwrap_or(now),
        }
    }
}
