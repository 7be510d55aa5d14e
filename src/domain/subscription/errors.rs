//! Subscription error taxonomy.
//!
//! Every operation failure falls into one of five buckets, each with a
//! stable machine-readable code the HTTP layer maps onto a status.

use thiserror::Error;

use crate::domain::foundation::AccountId;

/// Errors surfaced by reconciliation and the action handlers.
#[derive(Debug, Clone, Error)]
pub enum SubscriptionError {
    /// A required request field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// No subscription record exists for the account.
    #[error("No subscription found for account {0}")]
    NotFound(AccountId),

    /// The processor customer carries no account-identifier metadata.
    /// Indicates a customer created outside the provisioning path; never
    /// silently dropped.
    #[error("Account identifier missing in processor metadata for customer {customer_id}")]
    AccountResolution { customer_id: String },

    /// The requested action is not legal from the record's current state.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A processor or store call failed; the upstream message is surfaced.
    #[error("{0}")]
    Upstream(String),
}

impl SubscriptionError {
    /// Stable error code for API responses and logs.
    pub fn code(&self) -> &'static str {
        match self {
            SubscriptionError::Validation(_) => "VALIDATION_FAILED",
            SubscriptionError::NotFound(_) => "SUBSCRIPTION_NOT_FOUND",
            SubscriptionError::AccountResolution { .. } => "ACCOUNT_RESOLUTION_FAILED",
            SubscriptionError::InvalidTransition(_) => "INVALID_TRANSITION",
            SubscriptionError::Upstream(_) => "UPSTREAM_ERROR",
        }
    }

    /// Convenience constructor for missing-field validation failures.
    pub fn missing_field(field: &str) -> Self {
        SubscriptionError::Validation(format!("{} is required", field))
    }
}
