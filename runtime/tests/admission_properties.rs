//! Property tests for the no-overlap invariant.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // Test code can use unwrap/expect

use courtside_core::{BookingError, CandidateReservation, CourtId, TimeSlot};
use courtside_runtime::{AdmissionConfig, LocalLocker, ReservationService};
use courtside_testing::{InMemoryReservationStore, properties::slot_strategy, test_clock};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Step {
    Reserve(usize, TimeSlot),
    CancelNth(usize),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0usize..3, slot_strategy()).prop_map(|(court, slot)| Step::Reserve(court, slot)),
        1 => (0usize..16).prop_map(Step::CancelNth),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any sequence of reservations and cancellations leaves live
    /// reservations pairwise disjoint per court, and every rejection was
    /// justified by a live overlapping reservation at the time.
    #[test]
    fn prop_live_reservations_never_overlap(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let store = Arc::new(InMemoryReservationStore::new());
            let service = ReservationService::new(
                store.clone(),
                Arc::new(LocalLocker::new()),
                Arc::new(test_clock()),
                AdmissionConfig::default(),
            );
            let courts: Vec<CourtId> = (0..3).map(|i| CourtId::new(format!("court-{i}"))).collect();
            let mut admitted = Vec::new();

            for step in steps {
                match step {
                    Step::Reserve(court, slot) => {
                        let court_id = courts[court].clone();
                        let blocked_before = store
                            .all()
                            .iter()
                            .any(|r| r.blocks(&court_id, &slot));
                        match service
                            .reserve_court(court_id, CandidateReservation::new(slot, "prop"))
                            .await
                        {
                            Ok(reservation) => {
                                assert!(!blocked_before);
                                admitted.push(reservation.id);
                            }
                            Err(BookingError::CourtAlreadyReserved { .. }) => assert!(blocked_before),
                            Err(other) => panic!("unexpected error: {other}"),
                        }
                    }
                    Step::CancelNth(n) => {
                        if let Some(id) = admitted.get(n) {
                            // Second cancellation of the same id is rejected; either outcome is fine here.
                            let _ = service.cancel_reservation(*id, "prop").await;
                        }
                    }
                }
            }

            let live: Vec<_> = store.all().into_iter().filter(|r| !r.is_cancelled()).collect();
            for (i, a) in live.iter().enumerate() {
                for b in &live[i + 1..] {
                    assert!(
                        !(a.court_id == b.court_id && a.slot().overlaps(&b.slot())),
                        "overlapping live reservations: {a:?} and {b:?}"
                    );
                }
            }
        });
    }
}
