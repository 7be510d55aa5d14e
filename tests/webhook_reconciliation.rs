//! Integration tests for the webhook reconciliation flow.
//!
//! Drives the event pipeline end to end - normalizer, engine, record store -
//! over the in-memory adapters and the scripted gateway. No network.

use std::sync::Arc;

use serde_json::json;

use subtrack::adapters::memory::InMemoryRecordStore;
use subtrack::ports::RecordStore;
use subtrack::application::handlers::{
    ProcessEventCommand, ProcessEventHandler, ProcessEventResult,
};
use subtrack::application::normalizer::EventNormalizer;
use subtrack::domain::foundation::AccountId;
use subtrack::domain::subscription::{
    SubscriptionError, SubscriptionRecord, SubscriptionStatus, WebhookEnvelope,
};
use subtrack::test_utils::MockGateway;

// =============================================================================
// Fixtures
// =============================================================================

fn account() -> AccountId {
    AccountId::new("user-1").unwrap()
}

fn envelope(value: serde_json::Value) -> WebhookEnvelope {
    serde_json::from_value(value).unwrap()
}

fn subscription_created(ts: i64, plan: &str) -> WebhookEnvelope {
    envelope(json!({
        "id": format!("evt_created_{}", ts),
        "type": "customer.subscription.created",
        "created": ts,
        "data": { "object": {
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active",
            "created": ts,
            "cancel_at_period_end": false,
            "items": { "data": [{
                "price": { "id": plan },
                "current_period_start": ts,
                "current_period_end": ts + 2_592_000
            }] }
        } }
    }))
}

fn subscription_updated(ts: i64, status: &str, plan: &str) -> WebhookEnvelope {
    envelope(json!({
        "id": format!("evt_updated_{}", ts),
        "type": "customer.subscription.updated",
        "created": ts,
        "data": { "object": {
            "id": "sub_1",
            "customer": "cus_1",
            "status": status,
            "current_period_start": ts,
            "current_period_end": ts + 2_592_000,
            "cancel_at_period_end": false,
            "items": { "data": [{ "price": { "id": plan } }] }
        } }
    }))
}

fn subscription_deleted(ts: i64) -> WebhookEnvelope {
    envelope(json!({
        "id": format!("evt_deleted_{}", ts),
        "type": "customer.subscription.deleted",
        "created": ts,
        "data": { "object": {
            "id": "sub_1",
            "customer": "cus_1",
            "status": "canceled",
            "items": { "data": [{ "price": { "id": "price_1" } }] }
        } }
    }))
}

fn invoice_event(ts: i64, event_type: &str, subscription: Option<&str>) -> WebhookEnvelope {
    envelope(json!({
        "id": format!("evt_invoice_{}", ts),
        "type": event_type,
        "created": ts,
        "data": { "object": {
            "id": format!("in_{}", ts),
            "customer": "cus_1",
            "subscription": subscription,
            "created": ts,
            "amount_paid": 1999,
            "invoice_pdf": "https://invoices.example/latest.pdf"
        } }
    }))
}

async fn pipeline() -> (ProcessEventHandler, Arc<InMemoryRecordStore>) {
    let record = SubscriptionRecord::pending(account(), "cus_1", "sub_1", "price_1");
    let store = Arc::new(InMemoryRecordStore::with_record(record).await);
    let gateway = Arc::new(MockGateway::new().with_customer("cus_1", "user-1"));
    let handler = ProcessEventHandler::new(store.clone(), EventNormalizer::new(gateway));
    (handler, store)
}

async fn apply(handler: &ProcessEventHandler, envelope: WebhookEnvelope) -> ProcessEventResult {
    handler
        .handle(ProcessEventCommand { envelope })
        .await
        .unwrap()
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn full_lifecycle_created_updated_deleted() {
    let (handler, store) = pipeline().await;

    apply(&handler, subscription_created(1000, "price_1")).await;
    let record = store.get(&account()).await.unwrap().unwrap();
    assert_eq!(record.status, SubscriptionStatus::Active);
    assert_eq!(record.plan_id.as_deref(), Some("price_1"));

    apply(&handler, subscription_updated(2000, "past_due", "price_2")).await;
    let record = store.get(&account()).await.unwrap().unwrap();
    assert_eq!(record.status, SubscriptionStatus::PastDue);
    assert_eq!(record.plan_id.as_deref(), Some("price_2"));

    apply(&handler, subscription_deleted(3000)).await;
    let record = store.get(&account()).await.unwrap().unwrap();
    assert_eq!(record.status, SubscriptionStatus::Cancelled);
    assert!(record.cancelled_at.is_some());
    assert_eq!(record.cancel_reason.as_deref(), Some("Subscription deleted"));
}

#[tokio::test]
async fn duplicate_delivery_is_idempotent() {
    let (handler, store) = pipeline().await;
    let event = subscription_created(1000, "price_1");

    apply(&handler, event.clone()).await;
    let first = store.get(&account()).await.unwrap().unwrap();

    apply(&handler, event).await;
    let second = store.get(&account()).await.unwrap().unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn out_of_order_delivery_keeps_newest_state() {
    let (handler, store) = pipeline().await;

    apply(&handler, subscription_created(1000, "price_1")).await;
    // The newer update lands first...
    apply(&handler, subscription_updated(3000, "active", "price_3")).await;
    // ...then an older one is redelivered late.
    let result = apply(&handler, subscription_updated(2000, "past_due", "price_2")).await;

    assert!(matches!(result, ProcessEventResult::Ignored { .. }));
    let record = store.get(&account()).await.unwrap().unwrap();
    assert_eq!(record.plan_id.as_deref(), Some("price_3"));
    assert_eq!(record.status, SubscriptionStatus::Active);
}

// =============================================================================
// Invoice events
// =============================================================================

#[tokio::test]
async fn payment_succeeded_records_facts() {
    let (handler, store) = pipeline().await;
    apply(&handler, subscription_created(1000, "price_1")).await;

    apply(
        &handler,
        invoice_event(1500, "invoice.payment_succeeded", Some("sub_1")),
    )
    .await;

    let record = store.get(&account()).await.unwrap().unwrap();
    assert_eq!(record.status, SubscriptionStatus::Active);
    assert_eq!(record.last_payment_amount, Some(1999));
    assert_eq!(record.last_payment_date.unwrap().as_unix_seconds(), 1500);
    assert_eq!(
        record.last_invoice_url.as_deref(),
        Some("https://invoices.example/latest.pdf")
    );
}

#[tokio::test]
async fn payment_failed_cancels_subscription() {
    let (handler, store) = pipeline().await;
    apply(&handler, subscription_created(1000, "price_1")).await;

    apply(
        &handler,
        invoice_event(1500, "invoice.payment_failed", Some("sub_1")),
    )
    .await;

    let record = store.get(&account()).await.unwrap().unwrap();
    assert_eq!(record.status, SubscriptionStatus::Cancelled);
    assert_eq!(
        record.last_failed_payment_date.unwrap().as_unix_seconds(),
        1500
    );
}

#[tokio::test]
async fn one_off_invoice_is_ignored() {
    let (handler, store) = pipeline().await;
    apply(&handler, subscription_created(1000, "price_1")).await;
    let before = store.get(&account()).await.unwrap().unwrap();

    let result = apply(
        &handler,
        invoice_event(1500, "invoice.payment_failed", None),
    )
    .await;

    assert!(matches!(result, ProcessEventResult::Ignored { .. }));
    assert_eq!(store.get(&account()).await.unwrap().unwrap(), before);
}

// =============================================================================
// Failure surfaces
// =============================================================================

#[tokio::test]
async fn unhandled_event_type_is_acknowledged_not_failed() {
    let (handler, _store) = pipeline().await;

    let result = apply(
        &handler,
        envelope(json!({
            "id": "evt_other",
            "type": "payment_intent.created",
            "created": 1,
            "data": { "object": {} }
        })),
    )
    .await;

    assert_eq!(
        result,
        ProcessEventResult::Unhandled {
            event_type: "payment_intent.created".to_string()
        }
    );
}

#[tokio::test]
async fn unprovisioned_customer_fails_loudly() {
    let record = SubscriptionRecord::pending(account(), "cus_1", "sub_1", "price_1");
    let store = Arc::new(InMemoryRecordStore::with_record(record).await);
    let gateway = Arc::new(MockGateway::new().with_unprovisioned_customer("cus_1"));
    let handler = ProcessEventHandler::new(store.clone(), EventNormalizer::new(gateway));

    let result = handler
        .handle(ProcessEventCommand {
            envelope: subscription_created(1000, "price_1"),
        })
        .await;

    assert!(matches!(
        result,
        Err(SubscriptionError::AccountResolution { .. })
    ));
    // Record untouched.
    let record = store.get(&account()).await.unwrap().unwrap();
    assert_eq!(record.status, SubscriptionStatus::Pending);
}
