//! # Courtside Runtime
//!
//! Admission control for court reservations.
//!
//! This crate turns the contracts in `courtside-core` into a working
//! decision pipeline:
//!
//! ## Core Components
//!
//! - **Lock Manager** ([`lock`]): one exclusive lock per court, acquired for
//!   the duration of an admission decision
//! - **Overlap Evaluator** ([`overlap`]): asks the store for conflicting
//!   reservations and re-checks them against the half-open predicate
//! - **Admission Service** ([`admission`]): lock, evaluate, persist, release
//! - **Metrics** ([`metrics`]): Prometheus counters and histograms
//!
//! ## Example
//!
//! ```no_run
//! use courtside_core::{CandidateReservation, CourtId, ReservationStore, SystemClock, TimeSlot};
//! use courtside_runtime::{AdmissionConfig, LocalLocker, ReservationService};
//! use std::sync::Arc;
//!
//! # async fn example(store: Arc<dyn ReservationStore>, slot: TimeSlot) -> courtside_core::Result<()> {
//! let service = ReservationService::new(
//!     store,
//!     Arc::new(LocalLocker::new()),
//!     Arc::new(SystemClock),
//!     AdmissionConfig::default(),
//! );
//!
//! let reservation = service
//!     .reserve_court(CourtId::new("court-1"), CandidateReservation::new(slot, "alice"))
//!     .await?;
//! println!("reserved {}", reservation.id);
//! # Ok(())
//! # }
//! ```

/// Reservation admission service
pub mod admission;

/// Per-court resource locks
pub mod lock;

/// Prometheus metrics for observability
pub mod metrics;

/// Overlap evaluation against the store
pub mod overlap;

pub use admission::{AdmissionConfig, ReservationService};
pub use lock::{LocalLocker, LockFuture, LockHandle, ResourceLocker, ShardedLocker};
pub use overlap::{OverlapCheck, OverlapEvaluator};
