//! Processor gateway port for the external payment processor.
//!
//! Defines the slice of the processor's API this service touches: customer,
//! subscription, invoice, setup-intent and ephemeral-key operations. The
//! processor is the source of truth for billing facts; the gateway is
//! read/write but every write is a "set target state" call, safe to repeat.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::AccountId;

/// Port for the payment-processor client.
#[async_trait]
pub trait ProcessorGateway: Send + Sync {
    /// Retrieve a customer. Returns `None` for unknown or deleted customers.
    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, GatewayError>;

    /// Create a customer carrying the account identifier in its metadata.
    async fn create_customer(&self, request: CreateCustomerRequest)
        -> Result<Customer, GatewayError>;

    /// Update customer fields (email, default payment method).
    async fn update_customer(
        &self,
        customer_id: &str,
        update: CustomerUpdate,
    ) -> Result<Customer, GatewayError>;

    /// Create an incomplete subscription for the payment-sheet flow.
    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<NewSubscription, GatewayError>;

    /// Update subscription fields (cancellation schedule, default payment
    /// method). Returns the acknowledged subscription state.
    async fn update_subscription(
        &self,
        subscription_id: &str,
        update: SubscriptionUpdate,
    ) -> Result<ProcessorSubscription, GatewayError>;

    /// List a customer's most recent invoices, newest first.
    async fn list_invoices(
        &self,
        customer_id: &str,
        limit: u32,
    ) -> Result<Vec<Invoice>, GatewayError>;

    /// Attempt to collect payment for an invoice.
    async fn pay_invoice(&self, invoice_id: &str) -> Result<Invoice, GatewayError>;

    /// Create an off-session card setup intent for collecting a new payment
    /// method.
    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, GatewayError>;

    /// Create an ephemeral key for client-side customer access.
    async fn create_ephemeral_key(&self, customer_id: &str)
        -> Result<EphemeralKey, GatewayError>;
}

/// Request to create a processor customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    /// Account identifier, stored in customer metadata for event routing.
    pub account_id: AccountId,
    pub email: String,
    pub name: Option<String>,
}

/// Customer in the processor's system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Free-form metadata; the account identifier lives under `uid`.
    pub metadata: HashMap<String, String>,
}

impl Customer {
    /// Reads the stored account identifier, if provisioning set one.
    pub fn account_id(&self) -> Option<&str> {
        self.metadata.get("uid").map(String::as_str)
    }
}

/// Partial customer update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub email: Option<String>,
    pub default_payment_method: Option<String>,
}

/// Partial subscription update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    pub cancel_at_period_end: Option<bool>,
    pub default_payment_method: Option<String>,
}

/// Subscription state as the processor reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorSubscription {
    pub id: String,
    pub customer_id: String,
    /// Raw processor status string; the domain maps it onto the lifecycle.
    pub status: String,
    pub price_id: Option<String>,
    pub current_period_start: i64,
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
}

/// Result of creating a subscription for the payment sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscription {
    pub subscription: ProcessorSubscription,
    /// Client secret of the first invoice's payment intent.
    pub payment_intent_client_secret: Option<String>,
}

/// Invoice as the processor reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub customer_id: String,
    pub subscription_id: Option<String>,
    /// "draft" | "open" | "paid" | "void" | "uncollectible".
    pub status: String,
    pub created: i64,
    pub amount_paid: i64,
    pub amount_due: i64,
    pub invoice_pdf: Option<String>,
}

impl Invoice {
    pub fn is_open(&self) -> bool {
        self.status == "open"
    }
}

/// Setup intent for collecting a new payment method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupIntent {
    pub id: String,
    pub client_secret: String,
}

/// Ephemeral key for client-side customer access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemeralKey {
    pub id: String,
    pub secret: String,
}

/// Errors from processor gateway operations.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    /// Whether the caller may retry; timeouts and rate limits are.
    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: code.is_retryable(),
            code,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Network, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Api, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(GatewayErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Decode, message)
    }
}

/// Gateway error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Network connectivity issue or timeout.
    Network,
    /// The processor rejected the call.
    Api,
    /// Referenced resource does not exist.
    NotFound,
    /// Response could not be decoded.
    Decode,
    /// Rate limit exceeded.
    RateLimited,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayErrorCode::Network | GatewayErrorCode::RateLimited)
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::Network => "network_error",
            GatewayErrorCode::Api => "api_error",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::Decode => "decode_error",
            GatewayErrorCode::RateLimited => "rate_limited",
        };
        write!(f, "{}", s)
    }
}
