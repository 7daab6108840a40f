//! In-memory [`ReservationStore`] implementation.
//!
//! Backs tests and single-process deployments. All rows live under one
//! `RwLock`; every mutation takes the write guard for a short critical
//! section with no awaiting inside, which linearizes `compare_and_update`
//! calls per reservation id (and, conservatively, across ids — the contract
//! only requires per-id ordering). A remote document-store adapter would
//! implement the same trait with per-row transactions instead.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use turnstile_core::store::{Mutator, ReservationStore, StoreError};
use turnstile_core::types::{AttendeeId, EventId, Reservation, ReservationId, ReservationState};

#[derive(Default)]
struct Shelves {
    rows: HashMap<ReservationId, Reservation>,
    /// Live-claim index: one reservation per (event, attendee) slot.
    slots: HashMap<(EventId, AttendeeId), ReservationId>,
}

/// In-memory reservation store.
///
/// Share via `Arc`; clones of the handle observe the same rows.
#[derive(Default)]
pub struct MemoryReservationStore {
    inner: RwLock<Shelves>,
}

impl MemoryReservationStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn create(&self, reservation: Reservation) -> Result<Reservation, StoreError> {
        let key = (reservation.event_id, reservation.attendee_id);
        let mut inner = self.inner.write().await;

        let occupant = inner.slots.get(&key).copied();
        if let Some(occupant_id) = occupant {
            match inner.rows.get(&occupant_id).map(|row| row.state) {
                Some(state) if state.is_terminal() => {
                    // Terminal rows occupy the slot only until the next
                    // claim; clear the old outcome now.
                    inner.rows.remove(&occupant_id);
                    inner.slots.remove(&key);
                }
                Some(_) => return Err(StoreError::Conflict),
                None => {
                    inner.slots.remove(&key);
                }
            }
        }

        if inner.rows.contains_key(&reservation.id) {
            return Err(StoreError::Conflict);
        }

        inner.slots.insert(key, reservation.id);
        inner.rows.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn get(&self, id: ReservationId) -> Result<Reservation, StoreError> {
        self.inner
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_event_attendee(
        &self,
        event_id: EventId,
        attendee_id: AttendeeId,
    ) -> Result<Reservation, StoreError> {
        let inner = self.inner.read().await;
        inner
            .slots
            .get(&(event_id, attendee_id))
            .and_then(|id| inner.rows.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn compare_and_update(
        &self,
        id: ReservationId,
        expected: ReservationState,
        mutate: Mutator,
    ) -> Result<Reservation, StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        if row.state != expected {
            return Err(StoreError::StateMismatch {
                expected,
                actual: row.state,
            });
        }
        mutate(row);
        Ok(row.clone())
    }

    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<Reservation>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Reservation> = inner
            .rows
            .values()
            .filter(|row| row.event_id == event_id)
            .cloned()
            .collect();
        // Organizer ordering: latest check-ins first, then latest claims.
        rows.sort_by(|a, b| {
            b.checked_in_at
                .cmp(&a.checked_in_at)
                .then(b.reserved_at.cmp(&a.reserved_at))
        });
        Ok(rows)
    }
}
