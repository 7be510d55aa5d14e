//! HTTP DTOs for the billing endpoints.
//!
//! Field names follow the public API's camelCase wire format.

use serde::{Deserialize, Serialize};

use crate::domain::subscription::SubscriptionStatus;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to initiate the payment sheet.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSheetRequest {
    pub uid: String,
    #[serde(rename = "priceId")]
    pub price_id: String,
    pub email: String,
}

/// Request carrying only the account identifier (cancel, reactivate,
/// setup-intent creation).
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRequest {
    pub uid: String,
}

/// Request to apply a collected payment method.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyPaymentMethodRequest {
    pub uid: String,
    #[serde(rename = "paymentMethodId")]
    pub payment_method_id: String,
}

/// Request to change the billing email.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEmailRequest {
    pub uid: String,
    #[serde(rename = "newEmail")]
    pub new_email: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Webhook acknowledgement; returned for every accepted delivery, handled
/// or not.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Error body for failed requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Generic success wrapper for action endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ActionResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

/// Client secrets for the payment sheet.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSheetResponse {
    #[serde(rename = "paymentIntent")]
    pub payment_intent: Option<String>,
    #[serde(rename = "ephemeralKey")]
    pub ephemeral_key: String,
    pub customer: String,
    #[serde(rename = "subscriptionId")]
    pub subscription_id: String,
}

/// Payload for cancel/reactivate responses.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleData {
    pub status: SubscriptionStatus,
    #[serde(rename = "currentPeriodEnd")]
    pub current_period_end: String,
}

/// Response for setup-intent creation.
#[derive(Debug, Clone, Serialize)]
pub struct SetupIntentResponse {
    pub success: bool,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    #[serde(rename = "customerId")]
    pub customer_id: String,
}

/// Payload for the apply-payment-method response.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethodData {
    pub status: SubscriptionStatus,
    #[serde(rename = "paymentMethodId")]
    pub payment_method_id: String,
}

/// Response for the billing-email change.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateEmailResponse {
    pub success: bool,
    #[serde(rename = "billingEmail")]
    pub billing_email: String,
}
