//! HTTP handlers for the billing endpoints.
//!
//! These handlers connect axum routes to the application command handlers
//! and map domain errors onto HTTP responses.

use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use secrecy::ExposeSecret;

use crate::adapters::stripe::WebhookVerifier;
use crate::application::handlers::{
    ApplyPaymentMethodCommand, CancelSubscriptionCommand, CreateSetupIntentCommand,
    ProcessEventCommand, ReactivateSubscriptionCommand, StartSubscriptionCommand,
    UpdateEmailCommand,
};
use crate::domain::foundation::AccountId;
use crate::domain::subscription::SubscriptionError;

use super::super::AppState;
use super::dto::{
    AccountRequest, ActionResponse, ApplyPaymentMethodRequest, ErrorResponse, LifecycleData,
    PaymentMethodData, PaymentSheetRequest, PaymentSheetResponse, SetupIntentResponse,
    UpdateEmailRequest, UpdateEmailResponse, WebhookAck,
};

fn parse_uid(uid: &str) -> Result<AccountId, BillingApiError> {
    AccountId::new(uid)
        .map_err(|_| BillingApiError(SubscriptionError::missing_field("uid")))
}

// ════════════════════════════════════════════════════════════════════════════
// Webhook
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/stripe/webhook - verified processor event intake.
///
/// Distinct failure codes per contract: missing signature header is a 400,
/// missing secret configuration is a 500, verification failure is a 400.
/// Accepted deliveries always answer `{"received": true}`.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> axum::response::Response {
    let Some(signature) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Webhook delivery without signature header");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Webhook Error: Missing signature")),
        )
            .into_response();
    };

    let Some(secret) = &state.webhook_secret else {
        tracing::error!("Webhook secret not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Server configuration error")),
        )
            .into_response();
    };

    let verifier = WebhookVerifier::new(secret.expose_secret());
    let envelope = match verifier.verify_and_parse(&body, signature) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "Webhook signature verification failed");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("Webhook Error: {}", e))),
            )
                .into_response();
        }
    };

    tracing::info!(event_id = %envelope.id, event_type = %envelope.event_type, "Webhook event received");

    let handler = state.process_event_handler();
    match handler.handle(ProcessEventCommand { envelope }).await {
        Ok(_) => Json(WebhookAck { received: true }).into_response(),
        Err(e) => BillingApiError(e).into_response(),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// User actions
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/stripe/payment-sheet - start a subscription.
pub async fn payment_sheet(
    State(state): State<AppState>,
    Json(request): Json<PaymentSheetRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.start_subscription_handler();
    let cmd = StartSubscriptionCommand {
        account_id: parse_uid(&request.uid)?,
        price_id: request.price_id,
        email: request.email,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(PaymentSheetResponse {
        payment_intent: result.payment_intent_client_secret,
        ephemeral_key: result.ephemeral_key_secret,
        customer: result.customer_id,
        subscription_id: result.subscription_id,
    }))
}

/// POST /api/stripe/cancel-subscription - schedule cancellation.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Json(request): Json<AccountRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.cancel_subscription_handler();
    let cmd = CancelSubscriptionCommand {
        account_id: parse_uid(&request.uid)?,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(ActionResponse::with_data(
        "Subscription will be cancelled at the end of the billing period",
        LifecycleData {
            status: result.status,
            current_period_end: result.current_period_end.to_rfc3339(),
        },
    )))
}

/// POST /api/stripe/reactivate-subscription - clear a scheduled cancellation.
pub async fn reactivate_subscription(
    State(state): State<AppState>,
    Json(request): Json<AccountRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.reactivate_subscription_handler();
    let cmd = ReactivateSubscriptionCommand {
        account_id: parse_uid(&request.uid)?,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(ActionResponse::with_data(
        "Subscription has been successfully reactivated",
        LifecycleData {
            status: result.status,
            current_period_end: result.current_period_end.to_rfc3339(),
        },
    )))
}

/// POST /api/stripe/update-payment-method - create a card setup intent.
pub async fn update_payment_method(
    State(state): State<AppState>,
    Json(request): Json<AccountRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.create_setup_intent_handler();
    let cmd = CreateSetupIntentCommand {
        account_id: parse_uid(&request.uid)?,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(SetupIntentResponse {
        success: true,
        client_secret: result.client_secret,
        customer_id: result.customer_id,
    }))
}

/// POST /api/stripe/apply-payment-method - make the collected method the
/// default and retry the latest open invoice.
pub async fn apply_payment_method(
    State(state): State<AppState>,
    Json(request): Json<ApplyPaymentMethodRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    if request.payment_method_id.trim().is_empty() {
        return Err(BillingApiError(SubscriptionError::missing_field(
            "paymentMethodId",
        )));
    }

    let handler = state.apply_payment_method_handler();
    let cmd = ApplyPaymentMethodCommand {
        account_id: parse_uid(&request.uid)?,
        payment_method_id: request.payment_method_id,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(ActionResponse::with_data(
        "Payment method updated successfully",
        PaymentMethodData {
            status: result.status,
            payment_method_id: result.payment_method_id,
        },
    )))
}

/// POST /api/stripe/update-email - change the processor-side billing email.
pub async fn update_email(
    State(state): State<AppState>,
    Json(request): Json<UpdateEmailRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.update_email_handler();
    let cmd = UpdateEmailCommand {
        account_id: parse_uid(&request.uid)?,
        new_email: request.new_email,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(UpdateEmailResponse {
        success: true,
        billing_email: result.billing_email,
    }))
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

/// API error type that converts subscription errors to HTTP responses.
pub struct BillingApiError(pub SubscriptionError);

impl From<SubscriptionError> for BillingApiError {
    fn from(err: SubscriptionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            SubscriptionError::Validation(_) => StatusCode::BAD_REQUEST,
            SubscriptionError::NotFound(_) => StatusCode::NOT_FOUND,
            SubscriptionError::AccountResolution { .. } => StatusCode::BAD_REQUEST,
            SubscriptionError::InvalidTransition(_) => StatusCode::CONFLICT,
            // Upstream failures usually trace back to bad input; surfaced
            // with the upstream message.
            SubscriptionError::Upstream(_) => StatusCode::BAD_REQUEST,
        };

        tracing::warn!(code = self.0.code(), error = %self.0, "Billing request failed");
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}
