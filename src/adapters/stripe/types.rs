//! Stripe wire types.
//!
//! Deserialization targets for Stripe REST responses. Only fields this
//! service reads are captured; everything else is ignored.

use std::collections::HashMap;

use serde::Deserialize;

/// Customer object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Stripe returns `deleted: true` stubs for removed customers.
    #[serde(default)]
    pub deleted: bool,
}

/// Subscription object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub items: StripeSubscriptionItems,
    /// Present when created with `expand[]=latest_invoice.payment_intent`.
    #[serde(default)]
    pub latest_invoice: Option<StripeLatestInvoice>,
}

impl StripeSubscription {
    /// Price id of the first billing item.
    pub fn price_id(&self) -> Option<String> {
        self.items.data.first().map(|item| item.price.id.clone())
    }

    /// Period bounds, preferring the subscription-level fields and falling
    /// back to the first billing item's.
    pub fn period_bounds(&self) -> (i64, i64) {
        let item = self.items.data.first();
        let start = self
            .current_period_start
            .or_else(|| item.and_then(|i| i.current_period_start))
            .unwrap_or(0);
        let end = self
            .current_period_end
            .or_else(|| item.and_then(|i| i.current_period_end))
            .unwrap_or(0);
        (start, end)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: StripePrice,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeLatestInvoice {
    #[serde(default)]
    pub payment_intent: Option<StripePaymentIntent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Invoice object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoice {
    pub id: String,
    pub customer: String,
    #[serde(default)]
    pub subscription: Option<String>,
    pub status: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    #[serde(default)]
    pub invoice_pdf: Option<String>,
}

/// Setup intent object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSetupIntent {
    pub id: String,
    pub client_secret: String,
}

/// Ephemeral key object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEphemeralKey {
    pub id: String,
    pub secret: String,
}

/// Paginated list container.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscription_price_id_comes_from_first_item() {
        let sub: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active",
            "items": { "data": [
                { "price": { "id": "price_1" } },
                { "price": { "id": "price_2" } }
            ] }
        }))
        .unwrap();

        assert_eq!(sub.price_id().as_deref(), Some("price_1"));
    }

    #[test]
    fn period_bounds_fall_back_to_item_level() {
        let sub: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active",
            "items": { "data": [{
                "price": { "id": "price_1" },
                "current_period_start": 100,
                "current_period_end": 200
            }] }
        }))
        .unwrap();

        assert_eq!(sub.period_bounds(), (100, 200));
    }

    #[test]
    fn deleted_customer_stub_parses() {
        let customer: StripeCustomer = serde_json::from_value(json!({
            "id": "cus_1",
            "deleted": true
        }))
        .unwrap();
        assert!(customer.deleted);
        assert!(customer.metadata.is_empty());
    }

    #[test]
    fn invoice_list_parses() {
        let list: StripeList<StripeInvoice> = serde_json::from_value(json!({
            "object": "list",
            "data": [{
                "id": "in_1",
                "customer": "cus_1",
                "subscription": "sub_1",
                "status": "open",
                "created": 1000,
                "amount_due": 1999
            }]
        }))
        .unwrap();

        assert_eq!(list.data.len(), 1);
        assert_eq!(list.data[0].amount_due, 1999);
        assert_eq!(list.data[0].amount_paid, 0);
    }
}
