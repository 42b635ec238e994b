//! Reservation store contract.
//!
//! The admission service never talks to a database directly. It holds an
//! `Arc<dyn ReservationStore>` and relies on the guarantees documented on
//! each method.
//!
//! # Implementations
//!
//! - `PostgresReservationStore` (in `courtside-postgres`): production storage
//! - `InMemoryReservationStore` (in `courtside-testing`): fast tests with fault injection

use crate::error::StoreError;
use crate::types::{CourtId, Reservation, ReservationId, TimeSlot};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`ReservationStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Durable storage for reservations.
///
/// # Dyn Compatibility
///
/// Methods return [`StoreFuture`] instead of using `async fn` so the trait
/// can be used as `Arc<dyn ReservationStore>`.
///
/// # Consistency
///
/// The store is not expected to enforce the no-overlap invariant itself. The
/// admission service calls [`find_overlapping`](Self::find_overlapping) and
/// [`create`](Self::create) under the same court lock.
pub trait ReservationStore: Send + Sync {
    /// Insert a new reservation.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on backend failure, including a duplicate id.
    fn create<'a>(&'a self, reservation: &'a Reservation) -> StoreFuture<'a, ()>;

    /// Non-cancelled reservations on `court_id` whose window intersects `slot`.
    ///
    /// Intersection is half-open: a record ending exactly at `slot.from()` is
    /// not returned.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] or [`StoreError::Decode`] on backend failure.
    fn find_overlapping<'a>(
        &'a self,
        court_id: &'a CourtId,
        slot: &'a TimeSlot,
    ) -> StoreFuture<'a, Vec<Reservation>>;

    /// Whether any non-cancelled reservation on `court_id` intersects `slot`.
    ///
    /// # Errors
    ///
    /// Same as [`find_overlapping`](Self::find_overlapping).
    fn has_overlapping<'a>(
        &'a self,
        court_id: &'a CourtId,
        slot: &'a TimeSlot,
    ) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let overlapping = self.find_overlapping(court_id, slot).await?;
            Ok(!overlapping.is_empty())
        })
    }

    /// Fetch a reservation by id, in any status.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no such record exists.
    fn get_by_id(&self, id: ReservationId) -> StoreFuture<'_, Reservation>;

    /// Mark a reservation cancelled and record who cancelled it.
    ///
    /// Status and attribution are updated atomically, and only while the
    /// record is not yet cancelled. The updated record is returned.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no such record exists.
    /// - [`StoreError::AlreadyCancelled`] if the record was cancelled first;
    ///   its attribution is left unchanged.
    fn cancel<'a>(&'a self, id: ReservationId, cancelled_by: &'a str)
    -> StoreFuture<'a, Reservation>;

    /// All reservations on `court_id` intersecting `slot`, any status,
    /// ordered by `reserved_from`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] or [`StoreError::Decode`] on backend failure.
    fn list_by_court_and_range<'a>(
        &'a self,
        court_id: &'a CourtId,
        slot: &'a TimeSlot,
    ) -> StoreFuture<'a, Vec<Reservation>>;
}
