//! In-memory reservation store with fault injection.
//!
//! [`InMemoryReservationStore`] implements the full
//! [`ReservationStore`](courtside_core::ReservationStore) contract over a
//! `HashMap`, plus knobs the admission tests need:
//!
//! - artificial latency before every operation, to widen race windows
//! - one-shot failures queued per operation
//! - per-operation call counters
//! - an over-reporting mode that ignores filters in `find_overlapping`

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use courtside_core::{
    CourtId, Reservation, ReservationId, ReservationStatus, ReservationStore, StoreError,
    StoreFuture, TimeSlot,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

#[derive(Debug, Default)]
struct State {
    reservations: HashMap<ReservationId, Reservation>,
    failures: HashMap<&'static str, VecDeque<StoreError>>,
    calls: HashMap<&'static str, usize>,
    over_report: bool,
}

/// `HashMap`-backed reservation store for fast, deterministic tests.
///
/// Cloning shares the underlying data.
///
/// # Example
///
/// ```
/// use courtside_testing::{InMemoryReservationStore, fixtures};
/// use courtside_core::{CourtId, ReservationStore, StoreError};
///
/// # async fn example() -> Result<(), StoreError> {
/// let store = InMemoryReservationStore::new();
/// let court = CourtId::new("court-1");
/// store.insert(fixtures::reservation(&court, fixtures::slot(9, 0, 10, 0)));
///
/// assert!(store.has_overlapping(&court, &fixtures::slot(9, 30, 10, 30)).await?);
/// assert!(!store.has_overlapping(&court, &fixtures::slot(10, 0, 11, 0)).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryReservationStore {
    state: Arc<RwLock<State>>,
    latency: Option<Duration>,
}

impl InMemoryReservationStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `latency` before every store operation.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seed a reservation directly, bypassing admission.
    pub fn insert(&self, reservation: Reservation) {
        self.state
            .write()
            .unwrap()
            .reservations
            .insert(reservation.id, reservation);
    }

    /// Number of stored reservations, any status.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().unwrap().reservations.len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().unwrap().reservations.is_empty()
    }

    /// All stored reservations ordered by start.
    #[must_use]
    pub fn all(&self) -> Vec<Reservation> {
        let mut all: Vec<_> = self
            .state
            .read()
            .unwrap()
            .reservations
            .values()
            .cloned()
            .collect();
        all.sort_by_key(|r| (r.reserved_from, r.court_id.clone()));
        all
    }

    /// Make the next call to `operation` fail with `error`.
    ///
    /// Queued failures for the same operation are returned in order.
    pub fn fail_next(&self, operation: &'static str, error: StoreError) {
        self.state
            .write()
            .unwrap()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// How many times `operation` was invoked, including failed calls.
    #[must_use]
    pub fn calls(&self, operation: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .calls
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    /// When enabled, `find_overlapping` returns every stored record.
    pub fn set_over_report(&self, enabled: bool) {
        self.state.write().unwrap().over_report = enabled;
    }

    /// Apply latency, count the call and pop any injected failure.
    async fn enter(&self, operation: &'static str) -> Result<(), StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state.write().unwrap();
        *state.calls.entry(operation).or_default() += 1;
        match state.failures.get_mut(operation).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl ReservationStore for InMemoryReservationStore {
    fn create<'a>(&'a self, reservation: &'a Reservation) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.enter("create").await?;
            let mut state = self.state.write().unwrap();
            if state.reservations.contains_key(&reservation.id) {
                return Err(StoreError::Database(format!(
                    "duplicate key value violates unique constraint: id {}",
                    reservation.id
                )));
            }
            state
                .reservations
                .insert(reservation.id, reservation.clone());
            Ok(())
        })
    }

    fn find_overlapping<'a>(
        &'a self,
        court_id: &'a CourtId,
        slot: &'a TimeSlot,
    ) -> StoreFuture<'a, Vec<Reservation>> {
        Box::pin(async move {
            self.enter("find_overlapping").await?;
            let state = self.state.read().unwrap();
            let mut found: Vec<_> = state
                .reservations
                .values()
                .filter(|r| state.over_report || r.blocks(court_id, slot))
                .cloned()
                .collect();
            found.sort_by_key(|r| r.reserved_from);
            Ok(found)
        })
    }

    fn get_by_id(&self, id: ReservationId) -> StoreFuture<'_, Reservation> {
        Box::pin(async move {
            self.enter("get_by_id").await?;
            self.state
                .read()
                .unwrap()
                .reservations
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound(id))
        })
    }

    fn cancel<'a>(
        &'a self,
        id: ReservationId,
        cancelled_by: &'a str,
    ) -> StoreFuture<'a, Reservation> {
        Box::pin(async move {
            self.enter("cancel").await?;
            let mut state = self.state.write().unwrap();
            let reservation = state
                .reservations
                .get_mut(&id)
                .ok_or(StoreError::NotFound(id))?;
            if reservation.is_cancelled() {
                return Err(StoreError::AlreadyCancelled(id));
            }
            reservation.status = ReservationStatus::Cancelled;
            reservation.cancelled_by =
                (!cancelled_by.is_empty()).then(|| cancelled_by.to_string());
            Ok(reservation.clone())
        })
    }

    fn list_by_court_and_range<'a>(
        &'a self,
        court_id: &'a CourtId,
        slot: &'a TimeSlot,
    ) -> StoreFuture<'a, Vec<Reservation>> {
        Box::pin(async move {
            self.enter("list_by_court_and_range").await?;
            let state = self.state.read().unwrap();
            let mut found: Vec<_> = state
                .reservations
                .values()
                .filter(|r| &r.court_id == court_id && r.slot().overlaps(slot))
                .cloned()
                .collect();
            found.sort_by_key(|r| r.reserved_from);
            Ok(found)
        })
    }
}
