//! Conflict detection for a candidate slot.

use courtside_core::{CourtId, Reservation, ReservationStore, StoreError, TimeSlot};

/// Outcome of an overlap evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlapCheck {
    /// No live reservation intersects the slot.
    Clear,
    /// These reservations intersect the slot.
    Conflict(Vec<Reservation>),
}

impl OverlapCheck {
    /// Whether the slot is free.
    #[must_use]
    pub const fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }
}

/// Asks a store for reservations colliding with a candidate slot.
///
/// Whatever the store returns is filtered again against the half-open
/// predicate, so a store that over-reports (wrong court, cancelled rows,
/// touching boundaries) cannot cause a false rejection.
#[derive(Clone, Copy)]
pub struct OverlapEvaluator<'a> {
    store: &'a dyn ReservationStore,
}

impl<'a> OverlapEvaluator<'a> {
    /// Evaluate against `store`.
    #[must_use]
    pub const fn new(store: &'a dyn ReservationStore) -> Self {
        Self { store }
    }

    /// Check `slot` on `court_id`.
    ///
    /// # Errors
    ///
    /// Propagates the store's error. A failed lookup is never reported as a
    /// conflict.
    pub async fn evaluate(
        &self,
        court_id: &CourtId,
        slot: &TimeSlot,
    ) -> Result<OverlapCheck, StoreError> {
        let candidates = self.store.find_overlapping(court_id, slot).await?;
        let conflicts: Vec<Reservation> = candidates
            .into_iter()
            .filter(|existing| existing.blocks(court_id, slot))
            .collect();

        if conflicts.is_empty() {
            Ok(OverlapCheck::Clear)
        } else {
            Ok(OverlapCheck::Conflict(conflicts))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use courtside_core::{CandidateReservation, ReservationStatus};
    use courtside_testing::{InMemoryReservationStore, fixtures};

    #[tokio::test]
    async fn test_clear_when_only_touching() {
        let store = InMemoryReservationStore::new();
        let court = CourtId::new("court-1");
        store.insert(fixtures::reservation(&court, fixtures::slot(9, 0, 10, 0)));

        let check = OverlapEvaluator::new(&store)
            .evaluate(&court, &fixtures::slot(10, 0, 11, 0))
            .await
            .unwrap();
        assert!(check.is_clear());
    }

    #[tokio::test]
    async fn test_conflict_lists_overlapping_reservations() {
        let store = InMemoryReservationStore::new();
        let court = CourtId::new("court-1");
        let existing = fixtures::reservation(&court, fixtures::slot(9, 0, 10, 30));
        store.insert(existing.clone());

        let check = OverlapEvaluator::new(&store)
            .evaluate(&court, &fixtures::slot(10, 0, 11, 0))
            .await
            .unwrap();
        assert_eq!(check, OverlapCheck::Conflict(vec![existing]));
    }

    #[tokio::test]
    async fn test_refilters_over_reporting_store() {
        let store = InMemoryReservationStore::new();
        let court = CourtId::new("court-1");
        let cancelled = CandidateReservation::new(fixtures::slot(9, 0, 11, 0), "alice")
            .with_status(ReservationStatus::Cancelled)
            .into_reservation(court.clone(), fixtures::test_clock_time());
        store.insert(cancelled);
        store.insert(fixtures::reservation(
            &CourtId::new("court-2"),
            fixtures::slot(9, 0, 11, 0),
        ));
        store.set_over_report(true);

        let check = OverlapEvaluator::new(&store)
            .evaluate(&court, &fixtures::slot(10, 0, 10, 30))
            .await
            .unwrap();
        assert!(check.is_clear());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_conflict() {
        let store = InMemoryReservationStore::new();
        store.fail_next("find_overlapping", StoreError::Database("boom".into()));

        let result = OverlapEvaluator::new(&store)
            .evaluate(&CourtId::new("court-1"), &fixtures::slot(9, 0, 10, 0))
            .await;
        assert_eq!(result, Err(StoreError::Database("boom".into())));
    }
}
