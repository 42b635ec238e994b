//! # Courtside Core
//!
//! Domain types and contracts for court reservation admission.
//!
//! This crate holds everything the admission runtime needs to *describe* a
//! booking decision without performing one:
//!
//! - **Types**: [`Reservation`], [`TimeSlot`], identifiers and status
//! - **Errors**: [`BookingError`] with an [`ErrorKind`] taxonomy, [`StoreError`]
//! - **Store contract**: the [`ReservationStore`] capability trait
//! - **Environment**: the [`Clock`] trait used to stamp `created_at`
//!
//! ## The Invariant
//!
//! For two reservations `A` and `B` on the same court where neither is
//! cancelled, their half-open intervals never intersect:
//!
//! ```text
//! NOT (A.from < B.to AND B.from < A.to)
//! ```
//!
//! [`TimeSlot::overlaps`] is that predicate. The runtime crate enforces the
//! invariant by evaluating it under a per-court lock.
//!
//! ## Example
//!
//! ```
//! use courtside_core::TimeSlot;
//! use chrono::{TimeZone, Utc};
//!
//! let nine = Utc.with_ymd_and_hms(2025, 11, 4, 9, 0, 0).unwrap();
//! let ten = Utc.with_ymd_and_hms(2025, 11, 4, 10, 0, 0).unwrap();
//! let eleven = Utc.with_ymd_and_hms(2025, 11, 4, 11, 0, 0).unwrap();
//!
//! let morning = TimeSlot::new(nine, ten).unwrap();
//! let late_morning = TimeSlot::new(ten, eleven).unwrap();
//!
//! // Touching boundaries do not overlap.
//! assert!(!morning.overlaps(&late_morning));
//! ```

pub mod environment;
pub mod error;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use environment::{Clock, SystemClock};
pub use error::{BookingError, ErrorKind, LockError, Result, StoreError};
pub use store::{ReservationStore, StoreFuture};
pub use types::{
    CandidateReservation, CourtId, Reservation, ReservationId, ReservationStatus, TimeSlot,
};
