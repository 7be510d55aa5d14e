//! Processor webhook event types.
//!
//! Two layers: [`WebhookEnvelope`] is the raw wire shape of a processor
//! event (only the fields we read), and [`CanonicalEvent`] is the normalized
//! `(type, account, payload)` form the reconciliation engine consumes. The
//! canonical form is a closed union - one variant per handled event type -
//! so handlers never poke at open-ended JSON.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, Timestamp};

/// Raw processor webhook event (simplified).
///
/// Additional fields from the processor's full event schema are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WebhookEnvelope {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "customer.subscription.created").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: WebhookEnvelopeData,
}

/// Container for event-specific data.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WebhookEnvelopeData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl WebhookEnvelope {
    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> WebhookEventType {
        WebhookEventType::from_str(&self.event_type)
    }

    /// Source timestamp of the event.
    pub fn occurred_at(&self) -> Timestamp {
        Timestamp::from_unix_seconds(self.created)
    }
}

/// Known processor event types that we handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventType {
    /// Initial subscription creation.
    SubscriptionCreated,
    /// Subscription updated (plan change, trial end, cancellation schedule).
    SubscriptionUpdated,
    /// Subscription deleted/ended.
    SubscriptionDeleted,
    /// Invoice paid successfully (initial or renewal).
    InvoicePaymentSucceeded,
    /// Invoice payment failed.
    InvoicePaymentFailed,
    /// Unknown or unhandled event type.
    Unknown,
}

impl WebhookEventType {
    /// Parse event type from the processor's string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            _ => Self::Unknown,
        }
    }

    /// Convert to the processor's event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionCreated => "customer.subscription.created",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::Unknown => "unknown",
        }
    }
}

/// Normalized processor event, ready for reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEvent {
    /// Processor event id, kept for logging and idempotency tracing.
    pub event_id: String,

    /// The account the event belongs to, resolved from customer metadata.
    pub account_id: AccountId,

    /// Source timestamp of the event (unix seconds). Drives the staleness
    /// watermarks on the record.
    pub occurred_at: i64,

    /// Typed payload.
    pub kind: EventKind,
}

/// Closed union of handled event payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    SubscriptionCreated(SubscriptionSnapshot),
    SubscriptionUpdated(SubscriptionSnapshot),
    SubscriptionDeleted {
        subscription_id: String,
        customer_id: String,
    },
    InvoicePaymentSucceeded(InvoiceSnapshot),
    InvoicePaymentFailed(InvoiceSnapshot),
}

/// Subscription fields carried by `customer.subscription.*` events.
///
/// Period bounds are already resolved by the normalizer: the creation event
/// reports them on the first billing item, the update event on the
/// subscription itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionSnapshot {
    pub subscription_id: String,
    pub customer_id: String,
    /// Processor-reported status string ("active", "past_due", ...).
    pub status: String,
    pub plan_id: String,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    pub cancel_at_period_end: bool,
    /// Processor-side creation time; only the creation event copies it.
    pub created: Timestamp,
}

/// Invoice fields carried by `invoice.*` events.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSnapshot {
    pub invoice_id: String,
    pub customer_id: String,
    /// Absent for one-off invoices; those are ignored by the engine.
    pub subscription_id: Option<String>,
    /// Invoice creation time, recorded as the payment timestamp.
    pub created: Timestamp,
    pub amount_paid: i64,
    pub invoice_pdf: Option<String>,
}
