//! The reservation state machine.
//!
//! Creation, approval, rejection, cancellation, and check-in of a single
//! attendee's claim on a single event. Every transition is one
//! `compare_and_update` against the store, keyed on the state the caller
//! expects — two conflicting concurrent transitions race safely, with exactly
//! one winner and a typed outcome for the loser.
//!
//! Gate rules, preserved from the product's documented policy:
//! - A paid event's claim reaches `Confirmed` only after the payment
//!   collaborator reports success; on decline no reservation is created.
//! - `requires_approval` starts claims `Pending` — unless payment succeeded,
//!   which satisfies the approval gate too (paid implies trust).

use crate::environment::Clock;
use crate::payment::{PaymentError, PaymentGateway};
use crate::settings::Settings;
use crate::store::{ReservationStore, StoreError};
use crate::token::TokenIssuer;
use crate::types::{
    AttendeeIdentity, EventPolicy, Reservation, ReservationId, ReservationState,
};
use std::sync::Arc;
use thiserror::Error;

/// Failure of a lifecycle operation.
///
/// Everything here is a typed outcome of one operation; nothing is fatal to
/// the process and nothing is retried automatically.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The attendee already holds a live reservation on the event
    #[error("attendee already holds a reservation for this event")]
    AlreadyReserved,
    /// No reservation matches the given id
    #[error("reservation not found")]
    NotFound,
    /// The payment collaborator refused or could not take the charge
    #[error(transparent)]
    Payment(#[from] PaymentError),
    /// The holder was already admitted; carries the row as last read
    #[error("reservation was already checked in")]
    AlreadyCheckedIn(Box<Reservation>),
    /// Check-in attempted while the claim still awaits host approval
    #[error("reservation is awaiting host approval")]
    ApprovalRequired,
    /// The requested transition does not exist from the row's current state
    #[error("no `{action}` transition from the {state} state")]
    InvalidTransition {
        /// Operation that was attempted
        action: &'static str,
        /// State the row was actually in
        state: ReservationState,
    },
    /// The store could not serve the request; transient
    #[error("reservation store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Conflict => Self::AlreadyReserved,
            StoreError::StateMismatch { actual, .. } => Self::InvalidTransition {
                action: "update",
                state: actual,
            },
            StoreError::Unavailable(message) => Self::Unavailable(message),
        }
    }
}

/// Drives every reservation state change.
///
/// Cheap to clone via the shared handles; hold it in an `Arc` when the door
/// verifier and an organizer surface share one instance.
pub struct ReservationLifecycle {
    store: Arc<dyn ReservationStore>,
    payments: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    tokens: TokenIssuer,
    settings: Settings,
}

impl ReservationLifecycle {
    /// Creates a lifecycle over the given collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn ReservationStore>,
        payments: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            payments,
            clock,
            tokens: TokenIssuer::new(),
            settings,
        }
    }

    /// Claims a spot on an event for an attendee.
    ///
    /// Charges first for paid events — no reservation row exists until the
    /// payment collaborator has reported success, and a declined charge
    /// leaves nothing behind for the attendee to clean up before retrying.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::AlreadyReserved`] when a live claim holds the slot;
    /// [`LifecycleError::Payment`] when the charge fails.
    pub async fn request_reservation(
        &self,
        event: &EventPolicy,
        attendee: &AttendeeIdentity,
    ) -> Result<Reservation, LifecycleError> {
        // Cheap pre-check so a duplicate request fails before any charge is
        // taken; create() below remains the authority under races.
        match self
            .store
            .find_by_event_attendee(event.event_id, attendee.id)
            .await
        {
            Ok(existing) if !existing.state.is_terminal() => {
                return Err(LifecycleError::AlreadyReserved);
            }
            Ok(_) | Err(StoreError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let payment_reference = if event.is_paid() {
            let receipt = self
                .payments
                .charge(event.price, &self.settings.currency)
                .await?;
            tracing::info!(
                event = %event.event_id,
                attendee = %attendee.id,
                amount = receipt.amount.cents(),
                reference = %receipt.reference,
                "charge captured"
            );
            Some(receipt.reference)
        } else {
            None
        };

        let paid = payment_reference.is_some();
        let state = if event.requires_approval && !paid {
            ReservationState::Pending
        } else {
            ReservationState::Confirmed
        };
        let ticket_token = match state {
            ReservationState::Confirmed => Some(self.tokens.issue()),
            _ => None,
        };

        let reservation = Reservation {
            id: ReservationId::new(),
            event_id: event.event_id,
            attendee_id: attendee.id,
            attendee_name: attendee.display_name.clone(),
            state,
            ticket_token,
            payment_reference,
            requires_approval: event.requires_approval,
            reserved_at: self.clock.now(),
            checked_in_at: None,
        };

        let created = self.store.create(reservation).await?;
        tracing::info!(
            reservation = %created.id,
            event = %created.event_id,
            attendee = %created.attendee_id,
            state = %created.state,
            "reservation created"
        );
        Ok(created)
    }

    /// Host approves a pending claim, minting its entry token.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the row is `Pending`.
    pub async fn approve(&self, id: ReservationId) -> Result<Reservation, LifecycleError> {
        let token = self.tokens.issue();
        let approved = self
            .transition(
                "approve",
                id,
                ReservationState::Pending,
                Box::new(move |row| {
                    row.state = ReservationState::Confirmed;
                    row.ticket_token = Some(token);
                }),
            )
            .await?;
        tracing::info!(reservation = %id, "reservation approved");
        Ok(approved)
    }

    /// Host declines a pending claim. Terminal; the slot frees on the next
    /// claim for the same event and attendee.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the row is `Pending`.
    pub async fn reject(&self, id: ReservationId) -> Result<Reservation, LifecycleError> {
        let rejected = self
            .transition(
                "reject",
                id,
                ReservationState::Pending,
                Box::new(|row| row.state = ReservationState::Rejected),
            )
            .await?;
        tracing::info!(reservation = %id, "reservation rejected");
        Ok(rejected)
    }

    /// Attendee withdraws a confirmed claim. The token is discarded; any
    /// refund runs in the payment collaborator, outside the core.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the row is `Confirmed`.
    pub async fn cancel(&self, id: ReservationId) -> Result<Reservation, LifecycleError> {
        let cancelled = self
            .transition(
                "cancel",
                id,
                ReservationState::Confirmed,
                Box::new(|row| {
                    row.state = ReservationState::Cancelled;
                    row.ticket_token = None;
                }),
            )
            .await?;
        tracing::info!(reservation = %id, "reservation cancelled");
        Ok(cancelled)
    }

    /// Admits the holder. Succeeds at most once per reservation.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::AlreadyCheckedIn`] on a duplicate (carrying the row
    /// as last read), [`LifecycleError::ApprovalRequired`] while pending, and
    /// [`LifecycleError::InvalidTransition`] from terminal states.
    pub async fn check_in(&self, id: ReservationId) -> Result<Reservation, LifecycleError> {
        let now = self.clock.now();
        let result = self
            .store
            .compare_and_update(
                id,
                ReservationState::Confirmed,
                Box::new(move |row| {
                    row.state = ReservationState::CheckedIn;
                    row.checked_in_at = Some(now);
                }),
            )
            .await;

        match result {
            Ok(admitted) => {
                tracing::info!(
                    reservation = %id,
                    attendee = %admitted.attendee_id,
                    "holder checked in"
                );
                Ok(admitted)
            }
            Err(StoreError::StateMismatch {
                actual: ReservationState::CheckedIn,
                ..
            }) => {
                // Lost the race to another scanner; report the committed row.
                let row = self.store.get(id).await?;
                Err(LifecycleError::AlreadyCheckedIn(Box::new(row)))
            }
            Err(StoreError::StateMismatch {
                actual: ReservationState::Pending,
                ..
            }) => Err(LifecycleError::ApprovalRequired),
            Err(StoreError::StateMismatch { actual, .. }) => {
                Err(LifecycleError::InvalidTransition {
                    action: "check_in",
                    state: actual,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Door staff's quick-approve: approval, token mint, and check-in as one
    /// operator action and one atomic update.
    ///
    /// If another caller approved the claim mid-action, falls through to a
    /// plain check-in against the fresh state.
    ///
    /// # Errors
    ///
    /// Same surface as [`Self::check_in`].
    pub async fn approve_and_check_in(
        &self,
        id: ReservationId,
    ) -> Result<Reservation, LifecycleError> {
        let token = self.tokens.issue();
        let now = self.clock.now();
        let result = self
            .store
            .compare_and_update(
                id,
                ReservationState::Pending,
                Box::new(move |row| {
                    row.state = ReservationState::CheckedIn;
                    row.ticket_token = Some(token);
                    row.checked_in_at = Some(now);
                }),
            )
            .await;

        match result {
            Ok(admitted) => {
                tracing::info!(
                    reservation = %id,
                    attendee = %admitted.attendee_id,
                    "pending holder approved and checked in"
                );
                Ok(admitted)
            }
            Err(StoreError::StateMismatch {
                actual: ReservationState::Confirmed,
                ..
            }) => self.check_in(id).await,
            Err(StoreError::StateMismatch {
                actual: ReservationState::CheckedIn,
                ..
            }) => {
                let row = self.store.get(id).await?;
                Err(LifecycleError::AlreadyCheckedIn(Box::new(row)))
            }
            Err(StoreError::StateMismatch { actual, .. }) => {
                Err(LifecycleError::InvalidTransition {
                    action: "approve_and_check_in",
                    state: actual,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Shared handle to the underlying store, for read surfaces that sit
    /// next to the lifecycle (organizer lists, the door verifier)
    #[must_use]
    pub fn store(&self) -> Arc<dyn ReservationStore> {
        Arc::clone(&self.store)
    }

    async fn transition(
        &self,
        action: &'static str,
        id: ReservationId,
        expected: ReservationState,
        mutate: crate::store::Mutator,
    ) -> Result<Reservation, LifecycleError> {
        match self.store.compare_and_update(id, expected, mutate).await {
            Ok(row) => Ok(row),
            Err(StoreError::StateMismatch { actual, .. }) => {
                Err(LifecycleError::InvalidTransition {
                    action,
                    state: actual,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}
