//! Axum router for the billing endpoints.

use axum::routing::post;
use axum::Router;

use super::super::AppState;
use super::handlers::{
    apply_payment_method, cancel_subscription, handle_webhook, payment_sheet,
    reactivate_subscription, update_email, update_payment_method,
};

/// Billing routes, mounted at `/api/stripe`.
///
/// - `POST /webhook` - processor event intake (signature-verified, no auth)
/// - `POST /payment-sheet` - start a subscription
/// - `POST /cancel-subscription` - schedule cancellation at period end
/// - `POST /reactivate-subscription` - clear a scheduled cancellation
/// - `POST /update-payment-method` - create a card setup intent
/// - `POST /apply-payment-method` - apply the collected payment method
/// - `POST /update-email` - change the billing email
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/payment-sheet", post(payment_sheet))
        .route("/cancel-subscription", post(cancel_subscription))
        .route("/reactivate-subscription", post(reactivate_subscription))
        .route("/update-payment-method", post(update_payment_method))
        .route("/apply-payment-method", post(apply_payment_method))
        .route("/update-email", post(update_email))
}
