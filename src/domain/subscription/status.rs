//! Subscription status state machine.
//!
//! Defines all possible subscription states and valid transitions
//! across the billing lifecycle.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle state of an account's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Payment sheet initiated, awaiting the first successful payment.
    Pending,

    /// Subscription is paid up and current.
    Active,

    /// User requested cancellation; remains billed-through until the
    /// period boundary event finalizes it.
    Cancelling,

    /// Terminal for this subscription id. A new subscription requires a
    /// new processor subscription.
    Cancelled,

    /// Processor reported a missed payment.
    PastDue,
}

impl SubscriptionStatus {
    /// Parses the processor's reported status string.
    ///
    /// The processor has more states than we track (trialing, incomplete,
    /// unpaid, ...); everything that is not an exact match for a tracked
    /// state maps onto the closest lifecycle state.
    pub fn from_processor(s: &str) -> Self {
        match s {
            "active" | "trialing" => Self::Active,
            "past_due" | "unpaid" => Self::PastDue,
            "canceled" | "cancelled" | "incomplete_expired" => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    /// Storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::PastDue => "past_due",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "cancelling" => Some(Self::Cancelling),
            "cancelled" => Some(Self::Cancelled),
            "past_due" => Some(Self::PastDue),
            _ => None,
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From PENDING
            (Pending, Active)
                | (Pending, Cancelled)
            // From ACTIVE
                | (Active, Active) // renewal / refresh
                | (Active, PastDue)
                | (Active, Cancelling)
                | (Active, Cancelled)
            // From CANCELLING
                | (Cancelling, Active) // reactivation
                | (Cancelling, Cancelled) // period boundary
            // From PAST_DUE
                | (PastDue, Active)
                | (PastDue, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Active, Cancelled],
            Active => vec![Active, PastDue, Cancelling, Cancelled],
            Cancelling => vec![Active, Cancelled],
            PastDue => vec![Active, Cancelled],
            Cancelled => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_activates_on_creation() {
        assert!(SubscriptionStatus::Pending.can_transition_to(&SubscriptionStatus::Active));
    }

    #[test]
    fn active_can_start_cancelling() {
        let result = SubscriptionStatus::Active.transition_to(SubscriptionStatus::Cancelling);
        assert_eq!(result, Ok(SubscriptionStatus::Cancelling));
    }

    #[test]
    fn cancelling_can_reactivate() {
        assert!(SubscriptionStatus::Cancelling.can_transition_to(&SubscriptionStatus::Active));
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(SubscriptionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn pending_cannot_start_cancelling() {
        assert!(SubscriptionStatus::Pending
            .transition_to(SubscriptionStatus::Cancelling)
            .is_err());
    }

    #[test]
    fn processor_status_mapping() {
        assert_eq!(
            SubscriptionStatus::from_processor("active"),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from_processor("past_due"),
            SubscriptionStatus::PastDue
        );
        assert_eq!(
            SubscriptionStatus::from_processor("canceled"),
            SubscriptionStatus::Cancelled
        );
        assert_eq!(
            SubscriptionStatus::from_processor("incomplete"),
            SubscriptionStatus::Pending
        );
    }

    #[test]
    fn storage_representation_round_trips() {
        for status in [
            SubscriptionStatus::Pending,
            SubscriptionStatus::Active,
            SubscriptionStatus::Cancelling,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::PastDue,
        ] {
            assert_eq!(SubscriptionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubscriptionStatus::parse("bogus"), None);
    }
}
