//! The reservation admission service.
//!
//! `reserve_court` is the only operation that takes the court lock. Within
//! one lock hold it evaluates overlap and, if clear, persists the record:
//!
//! ```text
//! acquire(court) ─► evaluate overlap ─┬─ Conflict ─► CourtAlreadyReserved
//!                                     └─ Clear ────► store.create
//!                 ◄──────────── release(court) on every path
//! ```
//!
//! Cancellation, listing and point lookup go straight to the store.

use crate::lock::ResourceLocker;
use crate::metrics::{AdmissionMetrics, LockMetrics};
use crate::overlap::{OverlapCheck, OverlapEvaluator};
use courtside_core::{
    BookingError, CandidateReservation, Clock, CourtId, DateTime, LockError, Reservation,
    ReservationId, ReservationStore, Result, StoreError, TimeSlot, Utc,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tunables for the admission service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdmissionConfig {
    /// Upper bound on waiting for a court lock. `None` waits indefinitely.
    pub lock_wait_limit: Option<Duration>,
}

impl AdmissionConfig {
    /// Default configuration: unbounded lock wait.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lock_wait_limit: None,
        }
    }

    /// Fail lock acquisition after `limit`.
    #[must_use]
    pub const fn with_lock_wait_limit(mut self, limit: Duration) -> Self {
        self.lock_wait_limit = Some(limit);
        self
    }
}

/// Admits, cancels and looks up court reservations.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct ReservationService {
    store: Arc<dyn ReservationStore>,
    locker: Arc<dyn ResourceLocker>,
    clock: Arc<dyn Clock>,
    config: AdmissionConfig,
}

impl ReservationService {
    /// Create a service over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn ReservationStore>,
        locker: Arc<dyn ResourceLocker>,
        clock: Arc<dyn Clock>,
        config: AdmissionConfig,
    ) -> Self {
        Self {
            store,
            locker,
            clock,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Reserve `court_id` for the candidate's slot.
    ///
    /// Returns the persisted record, with id and `created_at` assigned unless
    /// the candidate carried them.
    ///
    /// # Errors
    ///
    /// - [`BookingError::CourtAlreadyReserved`]: a live reservation overlaps
    /// - [`BookingError::Lock`]: the court lock could not be obtained
    /// - [`BookingError::Store`]: overlap lookup or insert failed (not retried)
    ///
    /// The court lock is released before any error is returned.
    #[tracing::instrument(
        skip_all,
        name = "reserve_court",
        fields(court_id = %court_id, from = %candidate.slot.from(), to = %candidate.slot.to())
    )]
    pub async fn reserve_court(
        &self,
        court_id: CourtId,
        candidate: CandidateReservation,
    ) -> Result<Reservation> {
        let started = Instant::now();
        let handle = match self
            .locker
            .acquire(&court_id, self.config.lock_wait_limit)
            .await
        {
            Ok(handle) => handle,
            Err(source) => {
                if matches!(source, LockError::Timeout { .. }) {
                    LockMetrics::record_timeout();
                }
                AdmissionMetrics::record_failure("acquire_lock");
                tracing::warn!(error = %source, "Failed to acquire court lock");
                return Err(BookingError::Lock { court_id, source });
            }
        };
        LockMetrics::record_wait(started.elapsed());
        tracing::trace!("Court lock acquired");

        let outcome = self.admit(&court_id, candidate).await;

        // The decision stands either way; a release fault is only reported.
        if let Err(e) = self.locker.release(handle) {
            tracing::warn!(error = %e, "Court lock release failed after admission decision");
        }
        outcome
    }

    /// Overlap check and insert. Caller holds the court lock.
    async fn admit(
        &self,
        court_id: &CourtId,
        candidate: CandidateReservation,
    ) -> Result<Reservation> {
        let slot = candidate.slot;
        match OverlapEvaluator::new(self.store.as_ref())
            .evaluate(court_id, &slot)
            .await
        {
            Ok(OverlapCheck::Clear) => {}
            Ok(OverlapCheck::Conflict(existing)) => {
                AdmissionMetrics::record_rejected();
                tracing::info!(
                    conflicts = existing.len(),
                    "Court already reserved for requested slot"
                );
                return Err(BookingError::CourtAlreadyReserved {
                    court_id: court_id.clone(),
                    slot,
                });
            }
            Err(source) => {
                return Err(store_failure("find_overlapping", Some(court_id), source));
            }
        }

        let reservation = candidate.into_reservation(court_id.clone(), self.clock.now());
        self.store
            .create(&reservation)
            .await
            .map_err(|source| store_failure("create", Some(court_id), source))?;

        AdmissionMetrics::record_admitted();
        tracing::info!(
            reservation_id = %reservation.id,
            status = %reservation.status,
            "Reservation admitted"
        );
        Ok(reservation)
    }

    /// Cancel a reservation, recording who cancelled it.
    ///
    /// Returns the updated record.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ReservationNotFound`]: no such reservation
    /// - [`BookingError::AlreadyCancelled`]: cancelled before, or by a
    ///   concurrent caller; the first attribution is kept
    /// - [`BookingError::Store`]: lookup or update failed
    #[tracing::instrument(skip_all, name = "cancel_reservation", fields(reservation_id = %reservation_id))]
    pub async fn cancel_reservation(
        &self,
        reservation_id: ReservationId,
        cancelled_by: &str,
    ) -> Result<Reservation> {
        let existing = self.lookup(reservation_id, None).await?;
        if existing.is_cancelled() {
            tracing::debug!(court_id = %existing.court_id, "Reservation already cancelled");
            return Err(BookingError::AlreadyCancelled { reservation_id });
        }

        let cancelled = match self.store.cancel(reservation_id, cancelled_by).await {
            Ok(cancelled) => cancelled,
            Err(StoreError::NotFound(_)) => {
                return Err(BookingError::ReservationNotFound { reservation_id });
            }
            Err(StoreError::AlreadyCancelled(_)) => {
                tracing::debug!(court_id = %existing.court_id, "Reservation cancelled concurrently");
                return Err(BookingError::AlreadyCancelled { reservation_id });
            }
            Err(source) => return Err(store_failure("cancel", Some(&existing.court_id), source)),
        };

        AdmissionMetrics::record_cancelled();
        tracing::info!(
            court_id = %cancelled.court_id,
            cancelled_by,
            "Reservation cancelled"
        );
        Ok(cancelled)
    }

    /// Reservations on `court_id` intersecting `[from, to)`, any status,
    /// ordered by start.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidTimeSlot`]: `from >= to`
    /// - [`BookingError::Store`]: the listing failed
    #[tracing::instrument(skip_all, name = "list_reservations", fields(court_id = %court_id))]
    pub async fn list_reservations(
        &self,
        court_id: &CourtId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reservation>> {
        let window = TimeSlot::new(from, to)?;
        let mut reservations = self
            .store
            .list_by_court_and_range(court_id, &window)
            .await
            .map_err(|source| store_failure("list_by_court_and_range", Some(court_id), source))?;

        reservations.sort_by_key(|reservation| reservation.reserved_from);
        tracing::debug!(count = reservations.len(), "Listed reservations");
        Ok(reservations)
    }

    /// Fetch one reservation on `court_id`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ReservationNotFound`]: missing, or it belongs to another court
    /// - [`BookingError::Store`]: the lookup failed
    #[tracing::instrument(
        skip_all,
        name = "get_reservation",
        fields(court_id = %court_id, reservation_id = %reservation_id)
    )]
    pub async fn get_reservation(
        &self,
        court_id: &CourtId,
        reservation_id: ReservationId,
    ) -> Result<Reservation> {
        let reservation = self.lookup(reservation_id, Some(court_id)).await?;
        if &reservation.court_id != court_id {
            tracing::debug!(actual_court = %reservation.court_id, "Reservation belongs to another court");
            return Err(BookingError::ReservationNotFound { reservation_id });
        }
        Ok(reservation)
    }

    async fn lookup(
        &self,
        reservation_id: ReservationId,
        court_id: Option<&CourtId>,
    ) -> Result<Reservation> {
        match self.store.get_by_id(reservation_id).await {
            Ok(reservation) => Ok(reservation),
            Err(StoreError::NotFound(_)) => Err(BookingError::ReservationNotFound { reservation_id }),
            Err(source) => Err(store_failure("get_by_id", court_id, source)),
        }
    }
}

fn store_failure(
    operation: &'static str,
    court_id: Option<&CourtId>,
    source: StoreError,
) -> BookingError {
    AdmissionMetrics::record_failure(operation);
    tracing::error!(operation, error = %source, "Reservation store operation failed");
    BookingError::Store {
        operation,
        court_id: court_id.cloned(),
        source,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::lock::LocalLocker;
    use courtside_core::{ErrorKind, ReservationStatus};
    use courtside_testing::{InMemoryReservationStore, fixtures, test_clock};

    struct Harness {
        store: Arc<InMemoryReservationStore>,
        locker: LocalLocker,
        service: ReservationService,
    }

    fn harness(config: AdmissionConfig) -> Harness {
        let store = Arc::new(InMemoryReservationStore::new());
        let locker = LocalLocker::new();
        let service = ReservationService::new(
            store.clone(),
            Arc::new(locker.clone()),
            Arc::new(test_clock()),
            config,
        );
        Harness {
            store,
            locker,
            service,
        }
    }

    fn court() -> CourtId {
        CourtId::new("court-1")
    }

    #[tokio::test]
    async fn test_reserve_persists_with_clock_time() {
        let h = harness(AdmissionConfig::default());
        let candidate = CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "alice");

        let reservation = h.service.reserve_court(court(), candidate).await.unwrap();

        assert_eq!(reservation.status, ReservationStatus::Reserved);
        assert_eq!(reservation.created_at, test_clock().now());
        assert_eq!(reservation.reserved_by, "alice");
        assert_eq!(h.store.len(), 1);
        assert_eq!(h.locker.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn test_overlap_rejected_and_not_persisted() {
        let h = harness(AdmissionConfig::default());
        h.service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(9, 0, 10, 30), "alice"))
            .await
            .unwrap();

        let err = h
            .service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(10, 0, 11, 0), "bob"))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::CourtAlreadyReserved { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(h.store.len(), 1);
        assert_eq!(h.locker.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn test_adjacent_slots_both_admitted() {
        let h = harness(AdmissionConfig::default());
        for (from, to) in [((9, 0), (10, 0)), ((10, 0), (11, 0))] {
            let slot = fixtures::slot(from.0, from.1, to.0, to.1);
            h.service
                .reserve_court(court(), CandidateReservation::new(slot, "alice"))
                .await
                .unwrap();
        }
        assert_eq!(h.store.len(), 2);
    }

    #[tokio::test]
    async fn test_lock_released_after_failed_write() {
        let h = harness(AdmissionConfig::default());
        h.store
            .fail_next("create", StoreError::Database("disk full".into()));

        let err = h
            .service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "alice"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Store {
                operation: "create",
                ..
            }
        ));
        assert!(err.is_retryable());
        assert_eq!(h.store.calls("create"), 1);

        let retry = h
            .service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "alice"))
            .await;
        assert!(retry.is_ok());
    }

    #[tokio::test]
    async fn test_overlap_lookup_failure_is_store_error() {
        let h = harness(AdmissionConfig::default());
        h.store
            .fail_next("find_overlapping", StoreError::Database("timeout".into()));

        let err = h
            .service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "alice"))
            .await
            .unwrap_err();

        match err {
            BookingError::Store {
                operation,
                court_id,
                ..
            } => {
                assert_eq!(operation, "find_overlapping");
                assert_eq!(court_id, Some(court()));
            }
            other => panic!("expected store error, got {other:?}"),
        }
        assert_eq!(h.store.calls("create"), 0);
    }

    #[tokio::test]
    async fn test_lock_wait_limit_surfaces_timeout() {
        let h = harness(AdmissionConfig::new().with_lock_wait_limit(Duration::from_millis(30)));
        let held = h.locker.acquire(&court(), None).await.unwrap();

        let err = h
            .service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "alice"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BookingError::Lock {
                source: LockError::Timeout { .. },
                ..
            }
        ));
        assert_eq!(h.store.calls("find_overlapping"), 0);
        drop(held);
    }

    #[tokio::test]
    async fn test_candidate_status_is_persisted_as_supplied() {
        let h = harness(AdmissionConfig::default());
        let candidate = CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "alice")
            .with_status(ReservationStatus::Pending);

        let reservation = h.service.reserve_court(court(), candidate).await.unwrap();
        assert_eq!(reservation.status, ReservationStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancellation_unblocks_slot() {
        let h = harness(AdmissionConfig::default());
        let slot = fixtures::slot(9, 0, 10, 0);
        let first = h
            .service
            .reserve_court(court(), CandidateReservation::new(slot, "alice"))
            .await
            .unwrap();

        let cancelled = h.service.cancel_reservation(first.id, "alice").await.unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by.as_deref(), Some("alice"));

        let second = h
            .service
            .reserve_court(court(), CandidateReservation::new(slot, "bob"))
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_second_cancel_rejected_without_store_write() {
        let h = harness(AdmissionConfig::default());
        let reservation = h
            .service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "alice"))
            .await
            .unwrap();

        h.service.cancel_reservation(reservation.id, "alice").await.unwrap();
        let err = h
            .service
            .cancel_reservation(reservation.id, "mallory")
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::AlreadyCancelled { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(h.store.calls("cancel"), 1);

        let stored = h
            .service
            .get_reservation(&court(), reservation.id)
            .await
            .unwrap();
        assert_eq!(stored.cancelled_by.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_cancel_unknown_is_not_found() {
        let h = harness(AdmissionConfig::default());
        let err = h
            .service
            .cancel_reservation(ReservationId::new(), "alice")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_cancel_of_vanished_record_is_not_found() {
        let h = harness(AdmissionConfig::default());
        let reservation = h
            .service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "alice"))
            .await
            .unwrap();
        h.store
            .fail_next("cancel", StoreError::NotFound(reservation.id));

        let err = h
            .service
            .cancel_reservation(reservation.id, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::ReservationNotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_losing_store_race_is_already_cancelled() {
        let h = harness(AdmissionConfig::default());
        let reservation = h
            .service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "alice"))
            .await
            .unwrap();
        h.store
            .fail_next("cancel", StoreError::AlreadyCancelled(reservation.id));

        let err = h
            .service
            .cancel_reservation(reservation.id, "mallory")
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::AlreadyCancelled { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_get_on_wrong_court_is_not_found() {
        let h = harness(AdmissionConfig::default());
        let reservation = h
            .service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "alice"))
            .await
            .unwrap();

        let found = h.service.get_reservation(&court(), reservation.id).await;
        assert_eq!(found.unwrap(), reservation);

        let err = h
            .service
            .get_reservation(&CourtId::new("court-2"), reservation.id)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::ReservationNotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_includes_cancelled_in_start_order() {
        let h = harness(AdmissionConfig::default());
        let late = h
            .service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(14, 0, 15, 0), "alice"))
            .await
            .unwrap();
        let early = h
            .service
            .reserve_court(court(), CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "bob"))
            .await
            .unwrap();
        h.service.cancel_reservation(early.id, "bob").await.unwrap();
        h.service
            .reserve_court(
                CourtId::new("court-2"),
                CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "carol"),
            )
            .await
            .unwrap();

        let window = fixtures::slot(0, 0, 23, 0);
        let listed = h
            .service
            .list_reservations(&court(), window.from(), window.to())
            .await
            .unwrap();

        let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
        assert!(listed[0].is_cancelled());
    }

    #[tokio::test]
    async fn test_list_rejects_inverted_window() {
        let h = harness(AdmissionConfig::default());
        let window = fixtures::slot(9, 0, 10, 0);
        let err = h
            .service
            .list_reservations(&court(), window.to(), window.from())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_preassigned_identity_is_kept() {
        let h = harness(AdmissionConfig::default());
        let id = ReservationId::new();
        let created = fixtures::test_clock_time() - chrono::Duration::days(1);
        let candidate = CandidateReservation::new(fixtures::slot(9, 0, 10, 0), "alice")
            .with_id(id)
            .with_created_at(created);

        let reservation = h.service.reserve_court(court(), candidate).await.unwrap();
        assert_eq!(reservation.id, id);
        assert_eq!(reservation.created_at, created);
    }
}
