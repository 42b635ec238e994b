//! # Courtside Testing
//!
//! Testing utilities for the reservation admission crates.
//!
//! This crate provides:
//! - [`InMemoryReservationStore`]: a `ReservationStore` with latency and fault injection
//! - [`FixedClock`]: deterministic time for `created_at`
//! - [`fixtures`]: slots and reservations on a fixed test day
//! - [`properties`]: proptest strategies for slots
//!
//! ## Example
//!
//! ```
//! use courtside_testing::{InMemoryReservationStore, fixtures, test_clock};
//! use courtside_core::{Clock, CourtId};
//!
//! let store = InMemoryReservationStore::new();
//! store.insert(fixtures::reservation(&CourtId::new("court-1"), fixtures::slot(9, 0, 10, 0)));
//! assert_eq!(store.len(), 1);
//! assert_eq!(test_clock().now(), fixtures::test_clock_time());
//! ```

use chrono::{DateTime, Utc};
use courtside_core::Clock;

mod reservation_store;

pub use reservation_store::InMemoryReservationStore;

/// Mock implementations of Environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use courtside_testing::mocks::FixedClock;
    /// use courtside_core::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(crate::fixtures::test_clock_time())
    }
}

/// Slots and reservations for tests.
///
/// Slots fall on 2025-01-02, the day after [`test_clock`], so reservations
/// created through the service are always in the clock's future.
pub mod fixtures {
    use super::{DateTime, Utc};
    use chrono::TimeZone;
    use courtside_core::{CandidateReservation, CourtId, Reservation, TimeSlot};

    /// The instant [`test_clock`](crate::test_clock) reports.
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp is invalid,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .expect("hardcoded timestamp should always be valid")
    }

    /// `[from_hour:from_minute, to_hour:to_minute)` on the fixture day.
    ///
    /// # Panics
    ///
    /// Panics on an out-of-range clock time or an empty/inverted slot.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn slot(from_hour: u32, from_minute: u32, to_hour: u32, to_minute: u32) -> TimeSlot {
        TimeSlot::new(at(from_hour, from_minute), at(to_hour, to_minute))
            .expect("fixture slot must have from < to")
    }

    /// An instant on the fixture day.
    ///
    /// # Panics
    ///
    /// Panics on an out-of-range clock time.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, hour, minute, 0)
            .single()
            .expect("fixture time must be a valid clock time")
    }

    /// A `reserved` reservation on `court_id`, created at [`test_clock_time`].
    #[must_use]
    pub fn reservation(court_id: &CourtId, slot: TimeSlot) -> Reservation {
        CandidateReservation::new(slot, "fixture").into_reservation(court_id.clone(), test_clock_time())
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use crate::fixtures;
    use chrono::Duration;
    use courtside_core::TimeSlot;
    use proptest::prelude::*;

    /// Slots on a five-minute grid within the fixture day, 5 to 180 minutes long.
    #[allow(clippy::expect_used)]
    pub fn slot_strategy() -> impl Strategy<Value = TimeSlot> {
        (0i64..200, 1i64..=36).prop_map(|(start, len)| {
            let from = fixtures::at(0, 0) + Duration::minutes(start * 5);
            let to = from + Duration::minutes(len * 5);
            TimeSlot::new(from, to).expect("positive length slot")
        })
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1, fixtures::test_clock_time());
    }

    #[test]
    fn test_fixture_slots_follow_clock_day() {
        let slot = fixtures::slot(9, 0, 10, 30);
        assert!(slot.from() > fixtures::test_clock_time());
        assert_eq!(slot.duration(), chrono::Duration::minutes(90));
    }

    proptest! {
        #[test]
        fn prop_generated_slots_are_non_empty(slot in properties::slot_strategy()) {
            prop_assert!(slot.from() < slot.to());
        }
    }
}
