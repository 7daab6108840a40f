//! Reservation lifecycle and entry verification.
//!
//! Attendees claim a spot on an event, optionally gated by payment or host
//! approval; a confirmed claim carries an unguessable ticket token rendered
//! into a scannable payload; door scanners verify payloads and admit each
//! reservation at most once, safely under concurrent scans.
//!
//! # Architecture
//!
//! ```text
//! attendee ──▶ ReservationLifecycle ──▶ ReservationStore (trait)
//!                    ▲    │                    ▲
//!     organizer ─────┘    └── TokenIssuer      │
//!                                              │
//! scanner ──▶ EntryVerifier ───────────────────┘
//!                 │
//!                 └── calls back into the lifecycle's check-in transition
//! ```
//!
//! The only serialization point in the system is the store's
//! `compare_and_update`, linearized per reservation id. Payment, identity,
//! and persistence are external collaborators behind traits; time is
//! injected through [`environment::Clock`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod environment;
pub mod lifecycle;
pub mod payment;
pub mod settings;
pub mod store;
pub mod token;
pub mod types;
pub mod verifier;

pub use environment::{Clock, SystemClock};
pub use lifecycle::{LifecycleError, ReservationLifecycle};
pub use payment::{PaymentError, PaymentGateway, Receipt};
pub use settings::Settings;
pub use store::{Mutator, ReservationStore, StoreError};
pub use token::{DecodeError, ScanPayload, TokenIssuer};
pub use types::{
    AttendanceSummary, AttendeeId, AttendeeIdentity, EventId, EventPolicy, Money, OrganizerId,
    PaymentReference, Reservation, ReservationId, ReservationState, TicketToken,
};
pub use verifier::{EntryVerifier, VerificationResult};
