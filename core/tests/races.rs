//! Races between concurrent scanners, organizers, and attendees.
//!
//! The linearization contract means every race has exactly one winner and a
//! typed outcome for each loser; these tests drive real task-level
//! concurrency on a multi-threaded runtime.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use tokio::task::JoinSet;
use turnstile_core::{
    LifecycleError, ReservationState, ReservationStore, TokenIssuer, VerificationResult,
};
use turnstile_testing::{fixtures, Harness};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_scans_admit_exactly_once() {
    let h = Harness::new();
    let event = fixtures::free_event();
    let attendee = fixtures::attendee("Kiran");

    let reservation = h
        .lifecycle
        .request_reservation(&event, &attendee)
        .await
        .unwrap();
    let token = reservation.ticket_token.unwrap();
    let payload = TokenIssuer::new().encode(event.event_id, attendee.id, &token);

    let mut scans = JoinSet::new();
    for _ in 0..12 {
        let verifier = h.verifier.clone();
        let payload = payload.clone();
        scans.spawn(async move { verifier.verify(&payload).await.unwrap() });
    }

    let mut admitted = 0;
    let mut already_used = 0;
    while let Some(outcome) = scans.join_next().await {
        match outcome.unwrap() {
            VerificationResult::Admitted(_) => admitted += 1,
            VerificationResult::AlreadyUsed { checked_in_at, .. } => {
                assert!(checked_in_at.is_some());
                already_used += 1;
            }
            other => panic!("unexpected scan outcome {other:?}"),
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(already_used, 11);

    let row = h.store.get(reservation.id).await.unwrap();
    assert_eq!(row.state, ReservationState::CheckedIn);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn approve_and_reject_race_has_one_winner() {
    let h = Harness::new();
    let event = fixtures::approval_event();
    let attendee = fixtures::attendee("Dilip");

    let reservation = h
        .lifecycle
        .request_reservation(&event, &attendee)
        .await
        .unwrap();

    let approving = {
        let lifecycle = h.lifecycle.clone();
        let id = reservation.id;
        tokio::spawn(async move { lifecycle.approve(id).await })
    };
    let rejecting = {
        let lifecycle = h.lifecycle.clone();
        let id = reservation.id;
        tokio::spawn(async move { lifecycle.reject(id).await })
    };

    let outcomes = [approving.await.unwrap(), rejecting.await.unwrap()];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one transition may claim the pending row");
    for outcome in &outcomes {
        if let Err(err) = outcome {
            assert!(
                matches!(err, LifecycleError::InvalidTransition { .. }),
                "loser observes the fresh state, got {err:?}"
            );
        }
    }

    let row = h.store.get(reservation.id).await.unwrap();
    assert!(matches!(
        row.state,
        ReservationState::Confirmed | ReservationState::Rejected
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_requests_create_one_row() {
    let h = Harness::new();
    let event = fixtures::free_event();
    let attendee = fixtures::attendee("Farah");

    let mut requests = JoinSet::new();
    for _ in 0..4 {
        let lifecycle = h.lifecycle.clone();
        let event = event.clone();
        let attendee = attendee.clone();
        requests.spawn(async move { lifecycle.request_reservation(&event, &attendee).await });
    }

    let mut created = 0;
    while let Some(outcome) = requests.join_next().await {
        match outcome.unwrap() {
            Ok(_) => created += 1,
            Err(LifecycleError::AlreadyReserved) => {}
            Err(other) => panic!("unexpected request outcome {other:?}"),
        }
    }
    assert_eq!(created, 1);

    let listed = h.store.list_by_event(event.event_id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn quick_approve_race_admits_once() {
    let h = Harness::new();
    let event = fixtures::approval_event();
    let attendee = fixtures::attendee("Gauri");

    let reservation = h
        .lifecycle
        .request_reservation(&event, &attendee)
        .await
        .unwrap();

    let mut doors = JoinSet::new();
    for _ in 0..2 {
        let verifier = h.verifier.clone();
        let id = reservation.id;
        doors.spawn(async move { verifier.admit_pending(id).await.unwrap() });
    }

    let mut admitted = 0;
    let mut already_used = 0;
    while let Some(outcome) = doors.join_next().await {
        match outcome.unwrap() {
            VerificationResult::Admitted(_) => admitted += 1,
            VerificationResult::AlreadyUsed { .. } => already_used += 1,
            other => panic!("unexpected quick-approve outcome {other:?}"),
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(already_used, 1);
}
