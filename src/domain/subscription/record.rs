//! Subscription record and partial-field patches.
//!
//! One record exists per account, created when a payment sheet is initiated
//! and never deleted afterwards. All writes after creation go through
//! [`RecordPatch`] so that concurrent handlers touching disjoint fields do
//! not clobber each other.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, Timestamp};

use super::status::SubscriptionStatus;

/// Persisted subscription state for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Owning account.
    pub account_id: AccountId,

    /// Current lifecycle state.
    pub status: SubscriptionStatus,

    /// Processor price/plan identifier.
    pub plan_id: Option<String>,

    /// Processor subscription identifier.
    pub subscription_id: Option<String>,

    /// Processor customer identifier.
    pub customer_id: Option<String>,

    /// Default payment method on the subscription.
    pub payment_method_id: Option<String>,

    /// Current billing period bounds.
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,

    /// Pending-cancellation flag; true only while status is `cancelling`.
    pub cancel_at_period_end: bool,

    /// When cancellation was requested or finalized.
    pub cancelled_at: Option<Timestamp>,

    /// Why the subscription ended (deletion events record one).
    pub cancel_reason: Option<String>,

    /// Processor-side creation time of the subscription.
    pub created_at: Option<Timestamp>,

    /// Most recent successful payment.
    pub last_payment_date: Option<Timestamp>,
    pub last_payment_amount: Option<i64>,

    /// Hosted PDF for the most recent paid invoice.
    pub last_invoice_url: Option<String>,

    /// Most recent failed payment.
    pub last_failed_payment_date: Option<Timestamp>,

    /// When the payment method was last changed through us.
    pub payment_method_updated_at: Option<Timestamp>,

    /// Source timestamp (unix seconds) of the newest applied
    /// `customer.subscription.*` event. Older events are dropped.
    pub subscription_synced_at: Option<i64>,

    /// Source timestamp (unix seconds) of the newest applied `invoice.*`
    /// event. Older events are dropped.
    pub payment_synced_at: Option<i64>,
}

impl SubscriptionRecord {
    /// Creates the initial `pending` record written when a payment sheet is
    /// initiated. This is the only full-record write in the system.
    pub fn pending(
        account_id: AccountId,
        customer_id: impl Into<String>,
        subscription_id: impl Into<String>,
        plan_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            status: SubscriptionStatus::Pending,
            plan_id: Some(plan_id.into()),
            subscription_id: Some(subscription_id.into()),
            customer_id: Some(customer_id.into()),
            payment_method_id: None,
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: false,
            cancelled_at: None,
            cancel_reason: None,
            created_at: None,
            last_payment_date: None,
            last_payment_amount: None,
            last_invoice_url: None,
            last_failed_payment_date: None,
            payment_method_updated_at: None,
            subscription_synced_at: None,
            payment_synced_at: None,
        }
    }

    /// Applies a patch, producing the next record state.
    ///
    /// Field-level overwrite only; applying the same patch twice is a fixed
    /// point, which is what makes event replay idempotent.
    pub fn apply(&self, patch: &RecordPatch) -> Self {
        let mut next = self.clone();
        patch.status.apply_to(&mut next.status);
        patch.plan_id.apply_to_option(&mut next.plan_id);
        patch
            .subscription_id
            .apply_to_option(&mut next.subscription_id);
        patch.customer_id.apply_to_option(&mut next.customer_id);
        patch
            .payment_method_id
            .apply_to_option(&mut next.payment_method_id);
        patch
            .current_period_start
            .apply_to_option(&mut next.current_period_start);
        patch
            .current_period_end
            .apply_to_option(&mut next.current_period_end);
        patch
            .cancel_at_period_end
            .apply_to(&mut next.cancel_at_period_end);
        patch.cancelled_at.apply_to_option(&mut next.cancelled_at);
        patch.cancel_reason.apply_to_option(&mut next.cancel_reason);
        patch.created_at.apply_to_option(&mut next.created_at);
        patch
            .last_payment_date
            .apply_to_option(&mut next.last_payment_date);
        patch
            .last_payment_amount
            .apply_to_option(&mut next.last_payment_amount);
        patch
            .last_invoice_url
            .apply_to_option(&mut next.last_invoice_url);
        patch
            .last_failed_payment_date
            .apply_to_option(&mut next.last_failed_payment_date);
        patch
            .payment_method_updated_at
            .apply_to_option(&mut next.payment_method_updated_at);
        patch
            .subscription_synced_at
            .apply_to_option(&mut next.subscription_synced_at);
        patch
            .payment_synced_at
            .apply_to_option(&mut next.payment_synced_at);
        next
    }
}

/// Tri-state field update used inside [`RecordPatch`].
///
/// `Keep` leaves the stored value untouched, `Set` overwrites it, and
/// `Clear` nulls it out (only meaningful for nullable fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Update<T> {
    Keep,
    Set(T),
    Clear,
}

// Manual impl: the derived one would demand `T: Default` for a variant
// that never holds a `T`.
impl<T> Default for Update<T> {
    fn default() -> Self {
        Update::Keep
    }
}

impl<T: Clone> Update<T> {
    /// Applies to a non-nullable target; `Clear` is treated as `Keep`.
    pub fn apply_to(&self, target: &mut T) {
        if let Update::Set(value) = self {
            *target = value.clone();
        }
    }

    /// Applies to a nullable target.
    pub fn apply_to_option(&self, target: &mut Option<T>) {
        match self {
            Update::Keep => {}
            Update::Set(value) => *target = Some(value.clone()),
            Update::Clear => *target = None,
        }
    }

    /// Returns true when the update would change nothing.
    pub fn is_keep(&self) -> bool {
        matches!(self, Update::Keep)
    }
}

/// Partial-field update for a subscription record.
///
/// Every reconciliation decision produces one of these; the record store
/// merges only the non-`Keep` fields so concurrent writers touching
/// disjoint fields never overwrite each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    pub status: Update<SubscriptionStatus>,
    pub plan_id: Update<String>,
    pub subscription_id: Update<String>,
    pub customer_id: Update<String>,
    pub payment_method_id: Update<String>,
    pub current_period_start: Update<Timestamp>,
    pub current_period_end: Update<Timestamp>,
    pub cancel_at_period_end: Update<bool>,
    pub cancelled_at: Update<Timestamp>,
    pub cancel_reason: Update<String>,
    pub created_at: Update<Timestamp>,
    pub last_payment_date: Update<Timestamp>,
    pub last_payment_amount: Update<i64>,
    pub last_invoice_url: Update<String>,
    pub last_failed_payment_date: Update<Timestamp>,
    pub payment_method_updated_at: Update<Timestamp>,
    pub subscription_synced_at: Update<i64>,
    pub payment_synced_at: Update<i64>,
}

impl RecordPatch {
    /// True when the patch carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.status.is_keep()
            && self.plan_id.is_keep()
            && self.subscription_id.is_keep()
            && self.customer_id.is_keep()
            && self.payment_method_id.is_keep()
            && self.current_period_start.is_keep()
            && self.current_period_end.is_keep()
            && self.cancel_at_period_end.is_keep()
            && self.cancelled_at.is_keep()
            && self.cancel_reason.is_keep()
            && self.created_at.is_keep()
            && self.last_payment_date.is_keep()
            && self.last_payment_amount.is_keep()
            && self.last_invoice_url.is_keep()
            && self.last_failed_payment_date.is_keep()
            && self.payment_method_updated_at.is_keep()
            && self.subscription_synced_at.is_keep()
            && self.payment_synced_at.is_keep()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SubscriptionRecord {
        SubscriptionRecord::pending(
            AccountId::new("acct-1").unwrap(),
            "cus_1",
            "sub_1",
            "price_1",
        )
    }

    #[test]
    fn pending_record_has_expected_shape() {
        let r = record();
        assert_eq!(r.status, SubscriptionStatus::Pending);
        assert_eq!(r.subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(r.customer_id.as_deref(), Some("cus_1"));
        assert!(!r.cancel_at_period_end);
        assert!(r.current_period_end.is_none());
    }

    #[test]
    fn apply_overwrites_only_set_fields() {
        let r = record();
        let patch = RecordPatch {
            status: Update::Set(SubscriptionStatus::Active),
            plan_id: Update::Set("price_2".to_string()),
            ..Default::default()
        };

        let next = r.apply(&patch);

        assert_eq!(next.status, SubscriptionStatus::Active);
        assert_eq!(next.plan_id.as_deref(), Some("price_2"));
        // Untouched fields carry over.
        assert_eq!(next.subscription_id, r.subscription_id);
        assert_eq!(next.customer_id, r.customer_id);
    }

    #[test]
    fn apply_clear_nulls_nullable_field() {
        let mut r = record();
        r.cancelled_at = Some(Timestamp::from_unix_seconds(1000));

        let patch = RecordPatch {
            cancelled_at: Update::Clear,
            ..Default::default()
        };

        let next = r.apply(&patch);
        assert!(next.cancelled_at.is_none());
    }

    #[test]
    fn apply_is_idempotent() {
        let r = record();
        let patch = RecordPatch {
            status: Update::Set(SubscriptionStatus::Active),
            current_period_end: Update::Set(Timestamp::from_unix_seconds(2000)),
            cancel_at_period_end: Update::Set(false),
            ..Default::default()
        };

        let once = r.apply(&patch);
        let twice = once.apply(&patch);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_patch_detection() {
        assert!(RecordPatch::default().is_empty());
        let patch = RecordPatch {
            cancel_at_period_end: Update::Set(true),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
