//! Domain types for the reservation and entry-verification subsystem.
//!
//! Value objects (identifiers, money, the ticket token), the `Reservation`
//! entity with its state enum, and the snapshots the core reads from external
//! collaborators (`EventPolicy`, `AttendeeIdentity`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an attendee, issued by the identity collaborator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendeeId(Uuid);

impl AttendeeId {
    /// Creates a new random `AttendeeId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `AttendeeId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AttendeeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttendeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a reservation
///
/// Assigned once at creation and never reused: a reservation recreated after
/// rejection or cancellation always receives a fresh identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// Creates a new random `ReservationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ReservationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an event organizer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizerId(Uuid);

impl OrganizerId {
    /// Creates a new random `OrganizerId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrganizerId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for OrganizerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrganizerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Ticket Token
// ============================================================================

/// The unguessable entry credential minted when a reservation is confirmed.
///
/// Drawn from the UUID v4 space (122 random bits) and rendered in the scan
/// payload as the standard hyphenated string form. A token is compared against
/// scanned input by exact string equality; an empty or garbled presented
/// string never matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketToken(Uuid);

impl TicketToken {
    /// Mints a fresh random token
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TicketToken` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Whether a presented credential string is exactly this token
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        !presented.is_empty() && presented == self.0.to_string()
    }
}

impl Default for TicketToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque receipt reference returned by the payment collaborator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReference(String);

impl PaymentReference {
    /// Wraps a provider-issued reference string
    #[must_use]
    pub const fn new(reference: String) -> Self {
        Self(reference)
    }

    /// Returns the reference as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole currency units
    ///
    /// # Panics
    ///
    /// Panics if the conversion would overflow (units * 100 > `u64::MAX`).
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn from_units(units: u64) -> Self {
        match units.checked_mul(100) {
            Some(cents) => Self(cents),
            None => panic!("Money::from_units overflow"),
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Reservation Entity
// ============================================================================

/// Lifecycle state of a reservation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationState {
    /// Awaiting host approval; carries no usable token
    Pending,
    /// Approved (or auto-confirmed); token minted, entry not yet used
    Confirmed,
    /// Admitted at the door; terminal for entry purposes
    CheckedIn,
    /// Declined by the host; terminal
    Rejected,
    /// Withdrawn by the attendee; terminal
    Cancelled,
}

impl ReservationState {
    /// Whether this state admits no further transitions
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }

    /// Whether a reservation in this state carries a ticket token
    #[must_use]
    pub const fn carries_token(&self) -> bool {
        matches!(self, Self::Confirmed | Self::CheckedIn)
    }
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::CheckedIn => "checked-in",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{label}")
    }
}

/// One attendee's claim on one event.
///
/// At most one reservation exists per `(event_id, attendee_id)` pair at a
/// time. All state changes flow through the lifecycle's compare-and-update
/// transitions; no field is mutated outside them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique identifier, immutable after creation
    pub id: ReservationId,
    /// Event claimed, immutable
    pub event_id: EventId,
    /// Claiming attendee, immutable
    pub attendee_id: AttendeeId,
    /// Display name snapshot from the identity collaborator
    pub attendee_name: String,
    /// Current lifecycle state
    pub state: ReservationState,
    /// Entry credential; present exactly while `state` carries a token
    pub ticket_token: Option<TicketToken>,
    /// Payment receipt for paid events; set at creation, never mutated
    pub payment_reference: Option<PaymentReference>,
    /// Approval-gate snapshot copied from the event policy at creation
    pub requires_approval: bool,
    /// When the claim was made
    pub reserved_at: DateTime<Utc>,
    /// When the holder was admitted; `Some` iff `state == CheckedIn`
    pub checked_in_at: Option<DateTime<Utc>>,
}

// ============================================================================
// External collaborator snapshots
// ============================================================================

/// The slice of an event record the core reads at reservation-creation time.
///
/// Owned by the external document store; the core never watches it for later
/// changes (the `requires_approval` flag is snapshotted onto the reservation).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPolicy {
    /// Event being claimed
    pub event_id: EventId,
    /// Organizer who owns approvals for this event
    pub organizer_id: OrganizerId,
    /// Ticket price; zero means free
    pub price: Money,
    /// Whether claims start pending host approval
    pub requires_approval: bool,
}

impl EventPolicy {
    /// Whether claiming this event requires a successful charge
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        !self.price.is_zero()
    }
}

/// Stable identity supplied by the authentication collaborator.
///
/// The core treats both fields as immutable inputs and never validates
/// credentials itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeIdentity {
    /// Opaque attendee identifier
    pub id: AttendeeId,
    /// Name shown at the door and in organizer views
    pub display_name: String,
}

// ============================================================================
// Organizer read model
// ============================================================================

/// Headline counts for an organizer's attendee list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// All reservations on the event, whatever their state
    pub total: usize,
    /// Awaiting approval
    pub pending: usize,
    /// Holding a token, not yet admitted
    pub confirmed: usize,
    /// Admitted at the door
    pub checked_in: usize,
}

impl AttendanceSummary {
    /// Tallies counts over a `list_by_event` result
    #[must_use]
    pub fn tally(reservations: &[Reservation]) -> Self {
        let mut summary = Self {
            total: reservations.len(),
            ..Self::default()
        };
        for reservation in reservations {
            match reservation.state {
                ReservationState::Pending => summary.pending += 1,
                ReservationState::Confirmed => summary.confirmed += 1,
                ReservationState::CheckedIn => summary.checked_in += 1,
                ReservationState::Rejected | ReservationState::Cancelled => {}
            }
        }
        summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn token_matches_only_its_own_rendering() {
        let token = TicketToken::new();
        assert!(token.matches(&token.to_string()));
        assert!(!token.matches(""));
        assert!(!token.matches("not-a-token"));
        assert!(!token.matches(&TicketToken::new().to_string()));
    }

    #[test]
    fn money_display_renders_cents() {
        assert_eq!(Money::from_cents(12_050).to_string(), "120.50");
        assert_eq!(Money::from_units(3).to_string(), "3.00");
        assert!(Money::from_cents(0).is_zero());
    }

    #[test]
    fn terminal_states_carry_no_token() {
        assert!(ReservationState::Rejected.is_terminal());
        assert!(ReservationState::Cancelled.is_terminal());
        assert!(!ReservationState::CheckedIn.is_terminal());
        assert!(ReservationState::Confirmed.carries_token());
        assert!(ReservationState::CheckedIn.carries_token());
        assert!(!ReservationState::Pending.carries_token());
    }

    #[test]
    fn summary_tallies_states() {
        let base = Reservation {
            id: ReservationId::new(),
            event_id: EventId::new(),
            attendee_id: AttendeeId::new(),
            attendee_name: "Asha".to_string(),
            state: ReservationState::Pending,
            ticket_token: None,
            payment_reference: None,
            requires_approval: true,
            reserved_at: Utc::now(),
            checked_in_at: None,
        };
        let mut rows = vec![base.clone(), base.clone(), base.clone()];
        rows[1].state = ReservationState::Confirmed;
        rows[1].ticket_token = Some(TicketToken::new());
        rows[2].state = ReservationState::Rejected;

        let summary = AttendanceSummary::tally(&rows);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.confirmed, 1);
        assert_eq!(summary.checked_in, 0);
    }
}
