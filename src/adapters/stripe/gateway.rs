//! Stripe processor gateway.
//!
//! Implements the `ProcessorGateway` port against the Stripe REST API.
//! All writes are "set target state" calls, safe to repeat under webhook
//! redelivery.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{
    CreateCustomerRequest, Customer, CustomerUpdate, EphemeralKey, GatewayError, Invoice,
    NewSubscription, ProcessorGateway, ProcessorSubscription, SetupIntent, SubscriptionUpdate,
};

use super::types::{
    StripeCustomer, StripeEphemeralKey, StripeInvoice, StripeList, StripeSetupIntent,
    StripeSubscription,
};

/// Stripe API version pinned for ephemeral keys and payload stability.
const STRIPE_API_VERSION: &str = "2023-10-16";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the Stripe API (overridable for tests).
    api_base_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe gateway adapter.
pub struct StripeGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeGateway {
    /// Create a new gateway with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    fn api_key(&self) -> &str {
        self.config.api_key.expose_secret()
    }

    /// Maps a non-success response into a gateway error with the Stripe
    /// message attached.
    async fn error_from_response(
        operation: &str,
        response: reqwest::Response,
    ) -> GatewayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(operation = operation, status = %status, error = %body, "Stripe call failed");
        GatewayError::api(format!("Stripe API error: {}", body))
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::decode(format!("Failed to parse Stripe response: {}", e)))
    }
}

fn customer_from_wire(wire: StripeCustomer) -> Customer {
    Customer {
        id: wire.id,
        email: wire.email,
        name: wire.name,
        metadata: wire.metadata,
    }
}

fn subscription_from_wire(wire: StripeSubscription) -> ProcessorSubscription {
    let (start, end) = wire.period_bounds();
    ProcessorSubscription {
        price_id: wire.price_id(),
        id: wire.id,
        customer_id: wire.customer,
        status: wire.status,
        current_period_start: start,
        current_period_end: end,
        cancel_at_period_end: wire.cancel_at_period_end,
    }
}

fn invoice_from_wire(wire: StripeInvoice) -> Invoice {
    Invoice {
        id: wire.id,
        customer_id: wire.customer,
        subscription_id: wire.subscription,
        status: wire.status,
        created: wire.created,
        amount_paid: wire.amount_paid,
        amount_due: wire.amount_due,
        invoice_pdf: wire.invoice_pdf,
    }
}

#[async_trait]
impl ProcessorGateway for StripeGateway {
    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, GatewayError> {
        let response = self
            .http_client
            .get(self.url(&format!("/v1/customers/{}", customer_id)))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from_response("get_customer", response).await);
        }

        let wire: StripeCustomer = Self::decode(response).await?;
        if wire.deleted {
            return Ok(None);
        }
        Ok(Some(customer_from_wire(wire)))
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, GatewayError> {
        let mut params = vec![
            ("email", request.email.clone()),
            ("metadata[uid]", request.account_id.to_string()),
        ];
        if let Some(name) = &request.name {
            params.push(("name", name.clone()));
        }

        let response = self
            .http_client
            .post(self.url("/v1/customers"))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("create_customer", response).await);
        }

        let wire: StripeCustomer = Self::decode(response).await?;
        Ok(customer_from_wire(wire))
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        update: CustomerUpdate,
    ) -> Result<Customer, GatewayError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(email) = &update.email {
            params.push(("email", email.clone()));
        }
        if let Some(payment_method) = &update.default_payment_method {
            params.push((
                "invoice_settings[default_payment_method]",
                payment_method.clone(),
            ));
        }

        let response = self
            .http_client
            .post(self.url(&format!("/v1/customers/{}", customer_id)))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("update_customer", response).await);
        }

        let wire: StripeCustomer = Self::decode(response).await?;
        Ok(customer_from_wire(wire))
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<NewSubscription, GatewayError> {
        let params = [
            ("customer", customer_id.to_string()),
            ("items[0][price]", price_id.to_string()),
            ("payment_behavior", "default_incomplete".to_string()),
            ("expand[]", "latest_invoice.payment_intent".to_string()),
        ];

        let response = self
            .http_client
            .post(self.url("/v1/subscriptions"))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("create_subscription", response).await);
        }

        let wire: StripeSubscription = Self::decode(response).await?;
        let payment_intent_client_secret = wire
            .latest_invoice
            .as_ref()
            .and_then(|invoice| invoice.payment_intent.as_ref())
            .and_then(|intent| intent.client_secret.clone());

        Ok(NewSubscription {
            subscription: subscription_from_wire(wire),
            payment_intent_client_secret,
        })
    }

    async fn update_subscription(
        &self,
        subscription_id: &str,
        update: SubscriptionUpdate,
    ) -> Result<ProcessorSubscription, GatewayError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(cancel) = update.cancel_at_period_end {
            params.push(("cancel_at_period_end", cancel.to_string()));
        }
        if let Some(payment_method) = &update.default_payment_method {
            params.push(("default_payment_method", payment_method.clone()));
        }

        let response = self
            .http_client
            .post(self.url(&format!("/v1/subscriptions/{}", subscription_id)))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("update_subscription", response).await);
        }

        let wire: StripeSubscription = Self::decode(response).await?;
        Ok(subscription_from_wire(wire))
    }

    async fn list_invoices(
        &self,
        customer_id: &str,
        limit: u32,
    ) -> Result<Vec<Invoice>, GatewayError> {
        let response = self
            .http_client
            .get(self.url("/v1/invoices"))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .query(&[("customer", customer_id), ("limit", &limit.to_string())])
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("list_invoices", response).await);
        }

        let wire: StripeList<StripeInvoice> = Self::decode(response).await?;
        Ok(wire.data.into_iter().map(invoice_from_wire).collect())
    }

    async fn pay_invoice(&self, invoice_id: &str) -> Result<Invoice, GatewayError> {
        let response = self
            .http_client
            .post(self.url(&format!("/v1/invoices/{}/pay", invoice_id)))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("pay_invoice", response).await);
        }

        let wire: StripeInvoice = Self::decode(response).await?;
        Ok(invoice_from_wire(wire))
    }

    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, GatewayError> {
        let params = [
            ("customer", customer_id.to_string()),
            ("payment_method_types[]", "card".to_string()),
            // Off-session so the stored method can charge renewals.
            ("usage", "off_session".to_string()),
        ];

        let response = self
            .http_client
            .post(self.url("/v1/setup_intents"))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("create_setup_intent", response).await);
        }

        let wire: StripeSetupIntent = Self::decode(response).await?;
        Ok(SetupIntent {
            id: wire.id,
            client_secret: wire.client_secret,
        })
    }

    async fn create_ephemeral_key(
        &self,
        customer_id: &str,
    ) -> Result<EphemeralKey, GatewayError> {
        let response = self
            .http_client
            .post(self.url("/v1/ephemeral_keys"))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .form(&[("customer", customer_id)])
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("create_ephemeral_key", response).await);
        }

        let wire: StripeEphemeralKey = Self::decode(response).await?;
        Ok(EphemeralKey {
            id: wire.id,
            secret: wire.secret,
        })
    }
}
