//! Runtime settings loaded from environment variables with defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Core subsystem settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// ISO currency code passed to the payment collaborator on every charge
    pub currency: String,
}

impl Settings {
    /// Load settings from environment variables, falling back to defaults
    /// for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            currency: env::var("TURNSTILE_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_currency_is_set() {
        assert_eq!(Settings::default().currency, "INR");
    }
}
