//! Scripted in-memory processor gateway.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{
    CreateCustomerRequest, Customer, CustomerUpdate, EphemeralKey, GatewayError, Invoice,
    NewSubscription, ProcessorGateway, ProcessorSubscription, SetupIntent, SubscriptionUpdate,
};

/// Gateway double that records every call and serves scripted responses.
///
/// Operations listed in `failing` return an API error; everything else
/// succeeds with deterministic values.
pub struct MockGateway {
    calls: Mutex<Vec<String>>,
    customers: Mutex<HashMap<String, Customer>>,
    invoices: Mutex<Vec<Invoice>>,
    /// Status string returned by subscription updates.
    ack_status: Mutex<String>,
    /// Period end returned by subscription updates.
    ack_period_end: Mutex<i64>,
    failing: Mutex<HashSet<&'static str>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            customers: Mutex::new(HashMap::new()),
            invoices: Mutex::new(Vec::new()),
            ack_status: Mutex::new("active".to_string()),
            ack_period_end: Mutex::new(2000),
            failing: Mutex::new(HashSet::new()),
        }
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a customer carrying the `uid` metadata attribute.
    pub fn with_customer(self, customer_id: &str, uid: &str) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("uid".to_string(), uid.to_string());
        self.customers.lock().unwrap().insert(
            customer_id.to_string(),
            Customer {
                id: customer_id.to_string(),
                email: Some("user@example.test".to_string()),
                name: None,
                metadata,
            },
        );
        self
    }

    /// Registers a customer with no account metadata (bad provisioning).
    pub fn with_unprovisioned_customer(self, customer_id: &str) -> Self {
        self.customers.lock().unwrap().insert(
            customer_id.to_string(),
            Customer {
                id: customer_id.to_string(),
                email: None,
                name: None,
                metadata: HashMap::new(),
            },
        );
        self
    }

    /// Seeds the invoice list returned by `list_invoices`.
    pub fn with_invoices(self, invoices: Vec<Invoice>) -> Self {
        *self.invoices.lock().unwrap() = invoices;
        self
    }

    /// Sets the subscription status acknowledged by updates.
    pub fn acknowledging_status(self, status: &str) -> Self {
        *self.ack_status.lock().unwrap() = status.to_string();
        self
    }

    /// Sets the period end acknowledged by updates.
    pub fn acknowledging_period_end(self, period_end: i64) -> Self {
        *self.ack_period_end.lock().unwrap() = period_end;
        self
    }

    /// Makes the named operation fail ("update_subscription", "pay_invoice", ...).
    pub fn failing(self, op: &'static str) -> Self {
        self.failing.lock().unwrap().insert(op);
        self
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: &'static str) -> Result<(), GatewayError> {
        if self.failing.lock().unwrap().contains(op) {
            return Err(GatewayError::api(format!("scripted {} failure", op)));
        }
        Ok(())
    }

    fn subscription_ack(&self, subscription_id: &str, update: &SubscriptionUpdate) -> ProcessorSubscription {
        ProcessorSubscription {
            id: subscription_id.to_string(),
            customer_id: "cus_test".to_string(),
            status: self.ack_status.lock().unwrap().clone(),
            price_id: Some("price_test".to_string()),
            current_period_start: 1000,
            current_period_end: *self.ack_period_end.lock().unwrap(),
            cancel_at_period_end: update.cancel_at_period_end.unwrap_or(false),
        }
    }
}

#[async_trait]
impl ProcessorGateway for MockGateway {
    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, GatewayError> {
        self.record(format!("get_customer:{}", customer_id));
        self.check("get_customer")?;
        Ok(self.customers.lock().unwrap().get(customer_id).cloned())
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, GatewayError> {
        self.record(format!("create_customer:{}", request.account_id));
        self.check("create_customer")?;
        let mut metadata = HashMap::new();
        metadata.insert("uid".to_string(), request.account_id.to_string());
        let customer = Customer {
            id: format!("cus_{}", request.account_id),
            email: Some(request.email),
            name: request.name,
            metadata,
        };
        self.customers
            .lock()
            .unwrap()
            .insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        update: CustomerUpdate,
    ) -> Result<Customer, GatewayError> {
        self.record(format!(
            "update_customer:{}:{:?}:{:?}",
            customer_id, update.email, update.default_payment_method
        ));
        self.check("update_customer")?;
        let mut customers = self.customers.lock().unwrap();
        let customer = customers
            .entry(customer_id.to_string())
            .or_insert_with(|| Customer {
                id: customer_id.to_string(),
                email: None,
                name: None,
                metadata: HashMap::new(),
            });
        if let Some(email) = update.email {
            customer.email = Some(email);
        }
        Ok(customer.clone())
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<NewSubscription, GatewayError> {
        self.record(format!("create_subscription:{}:{}", customer_id, price_id));
        self.check("create_subscription")?;
        Ok(NewSubscription {
            subscription: ProcessorSubscription {
                id: format!("sub_{}", customer_id),
                customer_id: customer_id.to_string(),
                status: "incomplete".to_string(),
                price_id: Some(price_id.to_string()),
                current_period_start: 0,
                current_period_end: 0,
                cancel_at_period_end: false,
            },
            payment_intent_client_secret: Some("pi_secret_test".to_string()),
        })
    }

    async fn update_subscription(
        &self,
        subscription_id: &str,
        update: SubscriptionUpdate,
    ) -> Result<ProcessorSubscription, GatewayError> {
        self.record(format!(
            "update_subscription:{}:{:?}:{:?}",
            subscription_id, update.cancel_at_period_end, update.default_payment_method
        ));
        self.check("update_subscription")?;
        Ok(self.subscription_ack(subscription_id, &update))
    }

    async fn list_invoices(
        &self,
        customer_id: &str,
        limit: u32,
    ) -> Result<Vec<Invoice>, GatewayError> {
        self.record(format!("list_invoices:{}:{}", customer_id, limit));
        self.check("list_invoices")?;
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn pay_invoice(&self, invoice_id: &str) -> Result<Invoice, GatewayError> {
        self.record(format!("pay_invoice:{}", invoice_id));
        self.check("pay_invoice")?;
        Ok(Invoice {
            id: invoice_id.to_string(),
            customer_id: "cus_test".to_string(),
            subscription_id: Some("sub_test".to_string()),
            status: "paid".to_string(),
            created: 1000,
            amount_paid: 1999,
            amount_due: 0,
            invoice_pdf: None,
        })
    }

    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, GatewayError> {
        self.record(format!("create_setup_intent:{}", customer_id));
        self.check("create_setup_intent")?;
        Ok(SetupIntent {
            id: "seti_test".to_string(),
            client_secret: "seti_secret_test".to_string(),
        })
    }

    async fn create_ephemeral_key(
        &self,
        customer_id: &str,
    ) -> Result<EphemeralKey, GatewayError> {
        self.record(format!("create_ephemeral_key:{}", customer_id));
        self.check("create_ephemeral_key")?;
        Ok(EphemeralKey {
            id: "ephkey_test".to_string(),
            secret: "ek_secret_test".to_string(),
        })
    }
}
