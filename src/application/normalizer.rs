//! Event normalizer - raw processor webhooks to canonical events.
//!
//! Maps a raw inbound event into the `(type, account, payload)` triple the
//! reconciliation engine consumes. The owning account is resolved by
//! fetching the referenced processor customer live (no cache) and reading
//! the account identifier stored in its metadata at provisioning time.
//! Normalization performs no writes.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::subscription::{
    CanonicalEvent, EventKind, InvoiceSnapshot, SubscriptionError, SubscriptionSnapshot,
    WebhookEnvelope, WebhookEventType,
};
use crate::ports::ProcessorGateway;

/// Result of normalizing one raw event.
#[derive(Debug, Clone)]
pub enum NormalizedEvent {
    /// A handled event type, fully resolved.
    Handled(CanonicalEvent),
    /// An event type this service does not process. Acknowledged upstream,
    /// logged, never an error.
    Unhandled { event_id: String, event_type: String },
}

/// Normalizes raw webhook envelopes into canonical events.
pub struct EventNormalizer {
    gateway: Arc<dyn ProcessorGateway>,
}

impl EventNormalizer {
    pub fn new(gateway: Arc<dyn ProcessorGateway>) -> Self {
        Self { gateway }
    }

    /// Normalizes one envelope.
    ///
    /// Fails with `AccountResolution` when the referenced customer carries
    /// no account identifier - that customer was created outside the
    /// provisioning path and must be surfaced, not dropped.
    pub async fn normalize(
        &self,
        envelope: &WebhookEnvelope,
    ) -> Result<NormalizedEvent, SubscriptionError> {
        let event_type = envelope.parsed_type();

        let kind = match event_type {
            WebhookEventType::SubscriptionCreated | WebhookEventType::SubscriptionUpdated => {
                let object: SubscriptionObject = parse_object(envelope)?;
                let snapshot = object.into_snapshot(event_type)?;
                if event_type == WebhookEventType::SubscriptionCreated {
                    EventKind::SubscriptionCreated(snapshot)
                } else {
                    EventKind::SubscriptionUpdated(snapshot)
                }
            }
            WebhookEventType::SubscriptionDeleted => {
                let object: SubscriptionObject = parse_object(envelope)?;
                EventKind::SubscriptionDeleted {
                    subscription_id: object.id,
                    customer_id: object.customer,
                }
            }
            WebhookEventType::InvoicePaymentSucceeded => {
                let object: InvoiceObject = parse_object(envelope)?;
                EventKind::InvoicePaymentSucceeded(object.into_snapshot())
            }
            WebhookEventType::InvoicePaymentFailed => {
                let object: InvoiceObject = parse_object(envelope)?;
                EventKind::InvoicePaymentFailed(object.into_snapshot())
            }
            WebhookEventType::Unknown => {
                return Ok(NormalizedEvent::Unhandled {
                    event_id: envelope.id.clone(),
                    event_type: envelope.event_type.clone(),
                });
            }
        };

        let customer_id = match &kind {
            EventKind::SubscriptionCreated(s) | EventKind::SubscriptionUpdated(s) => {
                s.customer_id.clone()
            }
            EventKind::SubscriptionDeleted { customer_id, .. } => customer_id.clone(),
            EventKind::InvoicePaymentSucceeded(i) | EventKind::InvoicePaymentFailed(i) => {
                i.customer_id.clone()
            }
        };

        let account_id = self.resolve_account(&customer_id).await?;

        Ok(NormalizedEvent::Handled(CanonicalEvent {
            event_id: envelope.id.clone(),
            account_id,
            occurred_at: envelope.created,
            kind,
        }))
    }

    /// Looks up the customer and reads the `uid` metadata attribute.
    async fn resolve_account(&self, customer_id: &str) -> Result<AccountId, SubscriptionError> {
        let customer = self
            .gateway
            .get_customer(customer_id)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?
            .ok_or_else(|| {
                SubscriptionError::Upstream(format!("customer {} not found", customer_id))
            })?;

        let uid = customer
            .account_id()
            .ok_or_else(|| SubscriptionError::AccountResolution {
                customer_id: customer_id.to_string(),
            })?;

        AccountId::new(uid).map_err(|_| SubscriptionError::AccountResolution {
            customer_id: customer_id.to_string(),
        })
    }
}

fn parse_object<T: for<'de> Deserialize<'de>>(
    envelope: &WebhookEnvelope,
) -> Result<T, SubscriptionError> {
    serde_json::from_value(envelope.data.object.clone()).map_err(|e| {
        SubscriptionError::Validation(format!(
            "malformed {} payload: {}",
            envelope.event_type, e
        ))
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Wire payload shapes (only the fields we read)
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct SubscriptionObject {
    id: String,
    customer: String,
    status: String,
    #[serde(default)]
    created: i64,
    /// Subscription-level period bounds; what update events report.
    #[serde(default)]
    current_period_start: Option<i64>,
    #[serde(default)]
    current_period_end: Option<i64>,
    #[serde(default)]
    cancel_at_period_end: bool,
    #[serde(default)]
    items: SubscriptionItems,
}

#[derive(Debug, Default, Deserialize)]
struct SubscriptionItems {
    #[serde(default)]
    data: Vec<SubscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItem {
    price: ItemPrice,
    /// Item-level period bounds; the processor reports the authoritative
    /// bounds per line item on creation events.
    #[serde(default)]
    current_period_start: Option<i64>,
    #[serde(default)]
    current_period_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ItemPrice {
    id: String,
}

impl SubscriptionObject {
    /// Builds the snapshot, resolving period bounds per event type: the
    /// creation event carries them on the first billing item, the update
    /// event on the subscription itself.
    fn into_snapshot(
        self,
        event_type: WebhookEventType,
    ) -> Result<SubscriptionSnapshot, SubscriptionError> {
        let first_item = self.items.data.first().ok_or_else(|| {
            SubscriptionError::Validation("subscription event has no billing items".to_string())
        })?;

        let (start, end) = match event_type {
            WebhookEventType::SubscriptionCreated => {
                (first_item.current_period_start, first_item.current_period_end)
            }
            _ => (self.current_period_start, self.current_period_end),
        };
        let start = start.ok_or_else(|| {
            SubscriptionError::Validation("subscription event missing period start".to_string())
        })?;
        let end = end.ok_or_else(|| {
            SubscriptionError::Validation("subscription event missing period end".to_string())
        })?;

        Ok(SubscriptionSnapshot {
            subscription_id: self.id,
            customer_id: self.customer,
            status: self.status,
            plan_id: first_item.price.id.clone(),
            current_period_start: Timestamp::from_unix_seconds(start),
            current_period_end: Timestamp::from_unix_seconds(end),
            cancel_at_period_end: self.cancel_at_period_end,
            created: Timestamp::from_unix_seconds(self.created),
        })
    }
}

#[derive(Debug, Deserialize)]
struct InvoiceObject {
    id: String,
    customer: String,
    #[serde(default)]
    subscription: Option<String>,
    #[serde(default)]
    created: i64,
    #[serde(default)]
    amount_paid: i64,
    #[serde(default)]
    invoice_pdf: Option<String>,
}

impl InvoiceObject {
    fn into_snapshot(self) -> InvoiceSnapshot {
        InvoiceSnapshot {
            invoice_id: self.id,
            customer_id: self.customer,
            subscription_id: self.subscription,
            created: Timestamp::from_unix_seconds(self.created),
            amount_paid: self.amount_paid,
            invoice_pdf: self.invoice_pdf,
        }
    }
}
