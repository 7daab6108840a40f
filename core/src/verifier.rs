//! Door-side verification of scanned entry codes.
//!
//! Input is an untrusted, replayable byte string from any scanner. The
//! verifier decodes it, finds the matching reservation, and drives the
//! at-most-once admit decision through the lifecycle's check-in transition.
//! Every business outcome is a [`VerificationResult`] variant; the error
//! channel carries only backend unavailability (door UI: transient, re-scan).

use crate::lifecycle::{LifecycleError, ReservationLifecycle};
use crate::store::{ReservationStore, StoreError};
use crate::token::{DecodeError, TokenIssuer};
use crate::types::{Reservation, ReservationId, ReservationState};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Outcome of presenting one scanned code at the door.
///
/// Callers must handle every variant explicitly — all six are expected
/// operational outcomes, not errors.
#[derive(Debug)]
pub enum VerificationResult {
    /// Check-in committed; the holder enters
    Admitted(Reservation),
    /// The reservation was already used for entry
    AlreadyUsed {
        /// The committed row
        reservation: Reservation,
        /// When the prior admission happened, when recorded
        checked_in_at: Option<DateTime<Utc>>,
    },
    /// The claim still awaits host approval; door staff may quick-approve
    /// via [`EntryVerifier::admit_pending`], never an automatic admit
    ApprovalPending(Reservation),
    /// A reservation exists but the presented credential is wrong; nothing
    /// was mutated
    TokenMismatch,
    /// No reservation for the decoded event and attendee
    NotFound,
    /// The payload could not be decoded
    Malformed(DecodeError),
}

/// Decodes scan payloads and performs the admit-or-reject decision.
#[derive(Clone)]
pub struct EntryVerifier {
    store: Arc<dyn ReservationStore>,
    lifecycle: Arc<ReservationLifecycle>,
    tokens: TokenIssuer,
}

impl EntryVerifier {
    /// Creates a verifier sharing the lifecycle's store
    #[must_use]
    pub fn new(lifecycle: Arc<ReservationLifecycle>) -> Self {
        Self {
            store: lifecycle.store(),
            lifecycle,
            tokens: TokenIssuer::new(),
        }
    }

    /// Verifies one scanned payload.
    ///
    /// Decode failures, missing reservations, and credential mismatches
    /// return without touching state. A valid credential on a `Confirmed`
    /// row commits the check-in; if a concurrent scanner committed first,
    /// the fresh row is re-fetched and reported as [`VerificationResult::AlreadyUsed`].
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] only; every business outcome is an
    /// `Ok(VerificationResult)`.
    pub async fn verify(&self, raw: &[u8]) -> Result<VerificationResult, StoreError> {
        let payload = match self.tokens.decode(raw) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(error = %err, "scan payload rejected");
                return Ok(VerificationResult::Malformed(err));
            }
        };

        let reservation = match self
            .store
            .find_by_event_attendee(payload.event_id, payload.attendee_id)
            .await
        {
            Ok(reservation) => reservation,
            Err(StoreError::NotFound) => {
                tracing::warn!(
                    event = %payload.event_id,
                    attendee = %payload.attendee_id,
                    "scan matched no reservation"
                );
                return Ok(VerificationResult::NotFound);
            }
            Err(err) => return Err(err),
        };

        // Pending rows hold no token; never compare, never admit.
        if reservation.state == ReservationState::Pending {
            return Ok(VerificationResult::ApprovalPending(reservation));
        }

        let token_ok = reservation
            .ticket_token
            .as_ref()
            .is_some_and(|token| token.matches(&payload.token));
        if !token_ok {
            tracing::warn!(
                reservation = %reservation.id,
                event = %reservation.event_id,
                "presented credential does not match stored token"
            );
            return Ok(VerificationResult::TokenMismatch);
        }

        if reservation.state == ReservationState::CheckedIn {
            return Ok(VerificationResult::AlreadyUsed {
                checked_in_at: reservation.checked_in_at,
                reservation,
            });
        }

        self.admit(reservation.id).await
    }

    /// Operator-confirmed quick approve of a pending claim: approve, mint,
    /// and check in as one action.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] only, as with [`Self::verify`].
    pub async fn admit_pending(
        &self,
        id: ReservationId,
    ) -> Result<VerificationResult, StoreError> {
        match self.lifecycle.approve_and_check_in(id).await {
            Ok(admitted) => Ok(VerificationResult::Admitted(admitted)),
            Err(err) => Self::settle(err),
        }
    }

    async fn admit(&self, id: ReservationId) -> Result<VerificationResult, StoreError> {
        match self.lifecycle.check_in(id).await {
            Ok(admitted) => {
                tracing::info!(reservation = %id, "holder admitted");
                Ok(VerificationResult::Admitted(admitted))
            }
            Err(err) => Self::settle(err),
        }
    }

    /// Maps a lost race or refused transition onto the scan outcome the door
    /// should show for the now-current state.
    fn settle(err: LifecycleError) -> Result<VerificationResult, StoreError> {
        match err {
            LifecycleError::AlreadyCheckedIn(row) => Ok(VerificationResult::AlreadyUsed {
                checked_in_at: row.checked_in_at,
                reservation: *row,
            }),
            LifecycleError::NotFound => Ok(VerificationResult::NotFound),
            LifecycleError::Unavailable(message) => Err(StoreError::Unavailable(message)),
            // The claim stopped being admittable mid-scan (e.g. a concurrent
            // cancel); the presented credential is no longer usable.
            LifecycleError::ApprovalRequired
            | LifecycleError::InvalidTransition { .. }
            | LifecycleError::AlreadyReserved
            | LifecycleError::Payment(_) => Ok(VerificationResult::TokenMismatch),
        }
    }
}
