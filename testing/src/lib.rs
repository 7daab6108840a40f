//! Testing utilities for the reservation and entry-verification subsystem.
//!
//! Provides:
//! - Mock implementations of collaborator traits (clock, payment gateway)
//! - Fixture builders for events and attendees
//! - Invariant assertion helpers used after every transition in tests
//! - A wired harness (store + lifecycle + verifier) for scenario tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;
use turnstile_core::{
    EntryVerifier, ReservationLifecycle, Settings,
};
use turnstile_memstore::MemoryReservationStore;

/// Mock implementations for testing.
pub mod mocks {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use turnstile_core::payment::{PaymentError, PaymentGateway, Receipt};
    use turnstile_core::types::{Money, PaymentReference};
    use turnstile_core::Clock;
    use uuid::Uuid;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
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

    /// Create a default fixed clock for tests (2026-03-14 18:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2026-03-14T18:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Scripted payment gateway.
    ///
    /// Either approves every charge with a synthetic receipt or declines
    /// every charge with a fixed reason; counts the charges it saw either
    /// way, so tests can assert that free flows never touch payments.
    #[derive(Debug)]
    pub struct MockPaymentGateway {
        decline: Option<String>,
        charges: AtomicU32,
    }

    impl MockPaymentGateway {
        /// Gateway that approves every charge
        #[must_use]
        pub const fn approving() -> Self {
            Self {
                decline: None,
                charges: AtomicU32::new(0),
            }
        }

        /// Gateway that declines every charge with the given reason
        #[must_use]
        pub fn declining(reason: impl Into<String>) -> Self {
            Self {
                decline: Some(reason.into()),
                charges: AtomicU32::new(0),
            }
        }

        /// Number of charge attempts observed so far
        #[must_use]
        pub fn charges(&self) -> u32 {
            self.charges.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentGateway for MockPaymentGateway {
        async fn charge(&self, amount: Money, currency: &str) -> Result<Receipt, PaymentError> {
            self.charges.fetch_add(1, Ordering::SeqCst);
            match &self.decline {
                Some(reason) => Err(PaymentError::Declined {
                    reason: reason.clone(),
                }),
                None => Ok(Receipt {
                    reference: PaymentReference::new(format!("test_pay_{}", Uuid::new_v4())),
                    amount,
                    currency: currency.to_string(),
                }),
            }
        }
    }
}

/// Fixture builders for collaborator snapshots.
pub mod fixtures {
    use turnstile_core::types::{
        AttendeeId, AttendeeIdentity, EventId, EventPolicy, Money, OrganizerId,
    };

    /// Free event, no approval gate: claims confirm immediately
    #[must_use]
    pub fn free_event() -> EventPolicy {
        EventPolicy {
            event_id: EventId::new(),
            organizer_id: OrganizerId::new(),
            price: Money::from_cents(0),
            requires_approval: false,
        }
    }

    /// Free event whose claims start pending host approval
    #[must_use]
    pub fn approval_event() -> EventPolicy {
        EventPolicy {
            requires_approval: true,
            ..free_event()
        }
    }

    /// Paid event without an approval gate
    #[must_use]
    pub fn paid_event(price: Money) -> EventPolicy {
        EventPolicy {
            price,
            ..free_event()
        }
    }

    /// Paid event that also configures the approval gate (payment satisfies
    /// it, per the documented policy)
    #[must_use]
    pub fn paid_approval_event(price: Money) -> EventPolicy {
        EventPolicy {
            price,
            requires_approval: true,
            ..free_event()
        }
    }

    /// Attendee identity with a fresh id and the given display name
    #[must_use]
    pub fn attendee(name: &str) -> AttendeeIdentity {
        AttendeeIdentity {
            id: AttendeeId::new(),
            display_name: name.to_string(),
        }
    }
}

/// Invariant assertion helpers.
pub mod assertions {
    use turnstile_core::types::Reservation;

    /// Asserts the row-level invariants that must hold after every
    /// transition: the check-in timestamp exists iff the row is checked in,
    /// and a token exists iff the state carries one.
    ///
    /// # Panics
    ///
    /// Panics if either invariant is violated.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_reservation_coherent(reservation: &Reservation) {
        assert_eq!(
            reservation.checked_in_at.is_some(),
            reservation.state == turnstile_core::ReservationState::CheckedIn,
            "checked_in_at must be set iff state is CheckedIn: {reservation:?}"
        );
        assert_eq!(
            reservation.ticket_token.is_some(),
            reservation.state.carries_token(),
            "token must be present iff the state carries one: {reservation:?}"
        );
    }
}

/// Fully wired subsystem over the in-memory store, for scenario tests.
pub struct Harness {
    /// The shared in-memory store
    pub store: Arc<MemoryReservationStore>,
    /// The scripted payment gateway behind the lifecycle
    pub payments: Arc<mocks::MockPaymentGateway>,
    /// Deterministic clock all timestamps come from
    pub clock: Arc<mocks::FixedClock>,
    /// The lifecycle under test
    pub lifecycle: Arc<ReservationLifecycle>,
    /// The door verifier under test, sharing the lifecycle's store
    pub verifier: EntryVerifier,
}

impl Harness {
    /// Harness whose gateway approves every charge
    #[must_use]
    pub fn new() -> Self {
        Self::with_gateway(mocks::MockPaymentGateway::approving())
    }

    /// Harness whose gateway declines every charge
    #[must_use]
    pub fn with_declined_payments(reason: &str) -> Self {
        Self::with_gateway(mocks::MockPaymentGateway::declining(reason))
    }

    fn with_gateway(gateway: mocks::MockPaymentGateway) -> Self {
        let store = Arc::new(MemoryReservationStore::new());
        let payments = Arc::new(gateway);
        let clock = Arc::new(mocks::test_clock());
        let lifecycle = Arc::new(ReservationLifecycle::new(
            store.clone(),
            payments.clone(),
            clock.clone(),
            Settings::default(),
        ));
        let verifier = EntryVerifier::new(lifecycle.clone());
        Self {
            store,
            payments,
            clock,
            lifecycle,
            verifier,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize tracing for a test binary; safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use assertions::assert_reservation_coherent;
pub use mocks::{test_clock, FixedClock, MockPaymentGateway};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_deterministic() {
        use turnstile_core::Clock;
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }
}
