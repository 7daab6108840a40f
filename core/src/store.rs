//! The reservation store contract.
//!
//! Persistence itself lives behind this trait — a transactional document
//! collection owned by a deployment adapter (this workspace ships an
//! in-memory implementation in `turnstile-memstore`). The one guarantee every
//! implementation must honor is the linearization of `compare_and_update`
//! per reservation id; everything the lifecycle and the door verifier promise
//! rests on it.

use crate::types::{AttendeeId, EventId, Reservation, ReservationId, ReservationState};
use async_trait::async_trait;
use thiserror::Error;

/// Row mutation applied inside the `compare_and_update` critical section.
///
/// Runs exactly once, only after the state check passed, with no awaiting
/// allowed inside the store's critical section.
pub type Mutator = Box<dyn FnOnce(&mut Reservation) + Send>;

/// Integrity and availability failures reported by a store
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No reservation matches the requested key
    #[error("no reservation matches the requested key")]
    NotFound,
    /// The attendee already holds a live reservation on the event
    #[error("a reservation already exists for this event and attendee")]
    Conflict,
    /// A concurrent caller changed the row first; re-fetch and re-evaluate
    #[error("reservation is {actual}, not {expected}")]
    StateMismatch {
        /// State the caller keyed the update on
        expected: ReservationState,
        /// State actually found in the row
        actual: ReservationState,
    },
    /// The backend could not serve the request; transient, retry the whole
    /// operation
    #[error("reservation store unavailable: {0}")]
    Unavailable(String),
}

/// Persisted reservation records with atomic read-modify-write.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Inserts a new reservation.
    ///
    /// At most one reservation may exist per `(event_id, attendee_id)`; a
    /// prior rejected or cancelled row occupying the slot is deleted first,
    /// freeing it.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] if a live reservation already holds the slot.
    async fn create(&self, reservation: Reservation) -> Result<Reservation, StoreError>;

    /// Fetches a reservation by id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no such reservation exists.
    async fn get(&self, id: ReservationId) -> Result<Reservation, StoreError>;

    /// Fetches the reservation holding the `(event, attendee)` slot.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the slot is empty.
    async fn find_by_event_attendee(
        &self,
        event_id: EventId,
        attendee_id: AttendeeId,
    ) -> Result<Reservation, StoreError>;

    /// Atomically mutates a reservation, keyed on its expected current state.
    ///
    /// The read-check-write is one indivisible unit with respect to every
    /// other caller operating on the same id: of two concurrent conflicting
    /// transitions, exactly one succeeds and the other observes
    /// [`StoreError::StateMismatch`] carrying the fresh state. Calls against
    /// different ids do not serialize against each other beyond the store's
    /// own short critical sections.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the row does not exist;
    /// [`StoreError::StateMismatch`] if the row is not in `expected` state.
    async fn compare_and_update(
        &self,
        id: ReservationId,
        expected: ReservationState,
        mutate: Mutator,
    ) -> Result<Reservation, StoreError>;

    /// Lists every reservation on an event for organizer views, most recent
    /// check-in first, then most recent claim.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if the backend cannot serve the read.
    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<Reservation>, StoreError>;
}
