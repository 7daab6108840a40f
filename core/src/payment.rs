//! Payment collaborator contract.
//!
//! The core never talks to a gateway directly; it asks this trait to charge
//! and uses the opaque receipt. Refunds are the collaborator's business — a
//! cancelled reservation keeps its receipt readable for whatever refund
//! orchestration runs outside the core.

use crate::types::{Money, PaymentReference};
use async_trait::async_trait;
use thiserror::Error;

/// Charge failure reported by the payment collaborator
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// The provider refused the charge; the attendee may retry
    #[error("charge declined: {reason}")]
    Declined {
        /// Provider-supplied decline reason
        reason: String,
    },
    /// The provider could not be reached; transient
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),
}

/// Proof that a charge succeeded
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Opaque provider reference for the captured charge
    pub reference: PaymentReference,
    /// Amount actually charged
    pub amount: Money,
    /// Currency the charge was made in
    pub currency: String,
}

/// Abstraction over payment processors.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Authorizes and captures a charge.
    ///
    /// # Errors
    ///
    /// [`PaymentError::Declined`] when the provider refuses;
    /// [`PaymentError::Unavailable`] when it cannot be reached.
    async fn charge(&self, amount: Money, currency: &str) -> Result<Receipt, PaymentError>;
}
