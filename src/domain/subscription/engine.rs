//! Reconciliation engine - pure decision logic for the subscription
//! lifecycle.
//!
//! Processor events go through [`reconcile_event`], which turns the current
//! record plus a canonical event into either a [`RecordPatch`] or an explicit
//! ignore. User actions are split in two pure halves: a `plan_*` function
//! validates the action against the record and names the processor
//! [`Effect`]s it requires, and a `settle_*` function derives the patch from
//! the processor's acknowledgement. The async handlers sandwich the gateway
//! calls between the two halves; nothing in this module performs I/O.
//!
//! ## Idempotency
//!
//! Every decision is a field-level overwrite with event-sourced values.
//! Replaying an event against the record it produced yields the same record,
//! so webhook redelivery is always safe.
//!
//! ## Ordering
//!
//! Events are not reordered. Each event carries its source timestamp and the
//! record keeps one watermark per owned field group; an event strictly older
//! than its group's watermark is dropped as stale, an equal timestamp
//! re-applies (replay).

use crate::domain::foundation::Timestamp;

use super::errors::SubscriptionError;
use super::event::{CanonicalEvent, EventKind, InvoiceSnapshot, SubscriptionSnapshot};
use super::record::{RecordPatch, SubscriptionRecord, Update};
use super::status::SubscriptionStatus;

/// Outcome of reconciling one processor event.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Apply this patch to the record.
    Apply(RecordPatch),
    /// Leave the record untouched; the reason is logged by the caller.
    Ignored(IgnoreReason),
}

/// Why an event produced no record change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The event is older than what the record already reflects.
    Stale {
        event_ts: i64,
        watermark: i64,
    },
    /// Invoice event without a subscription reference (one-off invoice).
    NoSubscriptionReference,
}

impl IgnoreReason {
    pub fn describe(&self) -> String {
        match self {
            IgnoreReason::Stale {
                event_ts,
                watermark,
            } => format!(
                "event timestamp {} older than recorded watermark {}",
                event_ts, watermark
            ),
            IgnoreReason::NoSubscriptionReference => {
                "invoice has no subscription reference".to_string()
            }
        }
    }
}

/// Outbound processor call required by a reconciliation decision.
///
/// Effects are "set target state" operations, never increments, so the
/// processor side is idempotent under redelivery as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Schedule cancellation at the end of the current billing period.
    ScheduleCancellation { subscription_id: String },
    /// Remove a previously scheduled cancellation.
    ClearScheduledCancellation { subscription_id: String },
    /// Make the payment method the customer's invoice default.
    SetCustomerDefaultPaymentMethod {
        customer_id: String,
        payment_method_id: String,
    },
    /// Make the payment method the subscription's default.
    SetSubscriptionDefaultPaymentMethod {
        subscription_id: String,
        payment_method_id: String,
    },
    /// Best-effort: pay the customer's most recent open invoice.
    PayLatestOpenInvoice { customer_id: String },
    /// Update the customer's billing email (processor-side only).
    UpdateCustomerEmail { customer_id: String, email: String },
}

/// Policy applied when an invoice payment fails.
///
/// The strict policy cancels on the first failed subscription invoice. This
/// is the single decision point to swap for a grace-period/retry-count
/// policy; nothing else in the engine knows about the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentFailurePolicy {
    #[default]
    CancelImmediately,
}

impl PaymentFailurePolicy {
    /// Status the record moves to after a failed subscription invoice.
    pub fn decide(&self, _record: &SubscriptionRecord) -> SubscriptionStatus {
        match self {
            PaymentFailurePolicy::CancelImmediately => SubscriptionStatus::Cancelled,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Event reconciliation
// ════════════════════════════════════════════════════════════════════════════

/// Computes the record change for one canonical processor event.
///
/// Pure; the caller is responsible for loading the record, logging ignores,
/// and persisting the patch as a partial-field merge.
pub fn reconcile_event(
    record: &SubscriptionRecord,
    event: &CanonicalEvent,
    policy: PaymentFailurePolicy,
    now: Timestamp,
) -> ReconcileOutcome {
    // Staleness guard: compare against the watermark of the field group
    // this event type owns.
    let watermark = match event.kind {
        EventKind::SubscriptionCreated(_)
        | EventKind::SubscriptionUpdated(_)
        | EventKind::SubscriptionDeleted { .. } => record.subscription_synced_at,
        EventKind::InvoicePaymentSucceeded(_) | EventKind::InvoicePaymentFailed(_) => {
            record.payment_synced_at
        }
    };
    if let Some(watermark) = watermark {
        if event.occurred_at < watermark {
            return ReconcileOutcome::Ignored(IgnoreReason::Stale {
                event_ts: event.occurred_at,
                watermark,
            });
        }
    }

    match &event.kind {
        EventKind::SubscriptionCreated(snapshot) => {
            ReconcileOutcome::Apply(subscription_created_patch(snapshot, event.occurred_at))
        }
        EventKind::SubscriptionUpdated(snapshot) => {
            ReconcileOutcome::Apply(subscription_updated_patch(snapshot, event.occurred_at))
        }
        EventKind::SubscriptionDeleted { customer_id, .. } => ReconcileOutcome::Apply(RecordPatch {
            status: Update::Set(SubscriptionStatus::Cancelled),
            customer_id: Update::Set(customer_id.clone()),
            cancelled_at: Update::Set(now),
            cancel_reason: Update::Set("Subscription deleted".to_string()),
            subscription_synced_at: Update::Set(event.occurred_at),
            ..Default::default()
        }),
        EventKind::InvoicePaymentSucceeded(invoice) => {
            match invoice_payment_succeeded_patch(invoice, event.occurred_at) {
                Some(patch) => ReconcileOutcome::Apply(patch),
                None => ReconcileOutcome::Ignored(IgnoreReason::NoSubscriptionReference),
            }
        }
        EventKind::InvoicePaymentFailed(invoice) => {
            if invoice.subscription_id.is_none() {
                return ReconcileOutcome::Ignored(IgnoreReason::NoSubscriptionReference);
            }
            ReconcileOutcome::Apply(RecordPatch {
                status: Update::Set(policy.decide(record)),
                customer_id: Update::Set(invoice.customer_id.clone()),
                last_failed_payment_date: Update::Set(invoice.created),
                payment_synced_at: Update::Set(event.occurred_at),
                ..Default::default()
            })
        }
    }
}

/// Creation event: copy plan, ids, period bounds (item-level) and the
/// cancellation flag; adopt the processor-reported status.
fn subscription_created_patch(snapshot: &SubscriptionSnapshot, event_ts: i64) -> RecordPatch {
    RecordPatch {
        status: Update::Set(SubscriptionStatus::from_processor(&snapshot.status)),
        plan_id: Update::Set(snapshot.plan_id.clone()),
        subscription_id: Update::Set(snapshot.subscription_id.clone()),
        customer_id: Update::Set(snapshot.customer_id.clone()),
        created_at: Update::Set(snapshot.created),
        current_period_start: Update::Set(snapshot.current_period_start),
        current_period_end: Update::Set(snapshot.current_period_end),
        cancel_at_period_end: Update::Set(snapshot.cancel_at_period_end),
        subscription_synced_at: Update::Set(event_ts),
        ..Default::default()
    }
}

/// Update event: refresh plan/period/cancel-flag verbatim and set the status
/// from the event's reported status (this is how `past_due` arrives).
fn subscription_updated_patch(snapshot: &SubscriptionSnapshot, event_ts: i64) -> RecordPatch {
    RecordPatch {
        status: Update::Set(SubscriptionStatus::from_processor(&snapshot.status)),
        plan_id: Update::Set(snapshot.plan_id.clone()),
        customer_id: Update::Set(snapshot.customer_id.clone()),
        current_period_start: Update::Set(snapshot.current_period_start),
        current_period_end: Update::Set(snapshot.current_period_end),
        cancel_at_period_end: Update::Set(snapshot.cancel_at_period_end),
        subscription_synced_at: Update::Set(event_ts),
        ..Default::default()
    }
}

/// Successful payment: record the payment facts and mark the subscription
/// active. Does not touch `cancel_at_period_end` - a renewal payment can
/// land while a cancellation is scheduled.
fn invoice_payment_succeeded_patch(invoice: &InvoiceSnapshot, event_ts: i64) -> Option<RecordPatch> {
    invoice.subscription_id.as_ref()?;
    let mut patch = RecordPatch {
        status: Update::Set(SubscriptionStatus::Active),
        customer_id: Update::Set(invoice.customer_id.clone()),
        last_payment_date: Update::Set(invoice.created),
        last_payment_amount: Update::Set(invoice.amount_paid),
        payment_synced_at: Update::Set(event_ts),
        ..Default::default()
    };
    if let Some(pdf) = &invoice.invoice_pdf {
        patch.last_invoice_url = Update::Set(pdf.clone());
    }
    Some(patch)
}

// ════════════════════════════════════════════════════════════════════════════
// User actions: plan / settle
// ════════════════════════════════════════════════════════════════════════════

/// Validates a cancel request and names the required processor effect.
pub fn plan_cancel(record: &SubscriptionRecord) -> Result<Effect, SubscriptionError> {
    let subscription_id = record.subscription_id.clone().ok_or_else(|| {
        SubscriptionError::InvalidTransition("no active subscription to cancel".to_string())
    })?;
    Ok(Effect::ScheduleCancellation { subscription_id })
}

/// Patch applied once the processor acknowledged the scheduled cancellation.
pub fn settle_cancel(acknowledged_period_end: Timestamp, now: Timestamp) -> RecordPatch {
    RecordPatch {
        status: Update::Set(SubscriptionStatus::Cancelling),
        cancel_at_period_end: Update::Set(true),
        cancelled_at: Update::Set(now),
        current_period_end: Update::Set(acknowledged_period_end),
        ..Default::default()
    }
}

/// Validates a reactivate request and names the required processor effect.
///
/// Only a subscription still pending cancellation can be reactivated.
pub fn plan_reactivate(record: &SubscriptionRecord) -> Result<Effect, SubscriptionError> {
    let subscription_id = record.subscription_id.clone().ok_or_else(|| {
        SubscriptionError::InvalidTransition("no active subscription to reactivate".to_string())
    })?;
    if !record.cancel_at_period_end {
        return Err(SubscriptionError::InvalidTransition(
            "only subscriptions pending cancellation can be reactivated".to_string(),
        ));
    }
    Ok(Effect::ClearScheduledCancellation { subscription_id })
}

/// Patch applied once the processor acknowledged the reactivation; adopts the
/// processor-returned status.
pub fn settle_reactivate(acknowledged_status: &str) -> RecordPatch {
    RecordPatch {
        status: Update::Set(SubscriptionStatus::from_processor(acknowledged_status)),
        cancel_at_period_end: Update::Set(false),
        cancelled_at: Update::Clear,
        ..Default::default()
    }
}

/// Validates a payment-method change and lists the required effects in
/// execution order. The final invoice-payment effect is best-effort: its
/// failure is reported, never propagated.
pub fn plan_update_payment_method(
    record: &SubscriptionRecord,
    payment_method_id: &str,
) -> Result<Vec<Effect>, SubscriptionError> {
    let subscription_id = record.subscription_id.clone().ok_or_else(|| {
        SubscriptionError::InvalidTransition("no subscription on record".to_string())
    })?;
    let customer_id = record.customer_id.clone().ok_or_else(|| {
        SubscriptionError::InvalidTransition("no processor customer on record".to_string())
    })?;

    Ok(vec![
        Effect::SetCustomerDefaultPaymentMethod {
            customer_id: customer_id.clone(),
            payment_method_id: payment_method_id.to_string(),
        },
        Effect::SetSubscriptionDefaultPaymentMethod {
            subscription_id,
            payment_method_id: payment_method_id.to_string(),
        },
        Effect::PayLatestOpenInvoice { customer_id },
    ])
}

/// Patch persisted after the payment-method effects ran, regardless of the
/// best-effort invoice payment's outcome.
pub fn settle_payment_method(payment_method_id: &str, now: Timestamp) -> RecordPatch {
    RecordPatch {
        payment_method_id: Update::Set(payment_method_id.to_string()),
        payment_method_updated_at: Update::Set(now),
        ..Default::default()
    }
}

/// Validates a billing-email change. Email lives processor-side only, so no
/// settle step exists - the record is untouched.
pub fn plan_update_email(
    record: &SubscriptionRecord,
    email: &str,
) -> Result<Effect, SubscriptionError> {
    let customer_id = record.customer_id.clone().ok_or_else(|| {
        SubscriptionError::InvalidTransition("no processor customer on record".to_string())
    })?;
    Ok(Effect::UpdateCustomerEmail {
        customer_id,
        email: email.to_string(),
    })
}
