//! HTTP adapter - axum routers, handlers and DTOs.

pub mod billing;
pub mod verification;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use secrecy::SecretString;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::handlers::{
    ApplyPaymentMethodHandler, CancelSubscriptionHandler, CreateSetupIntentHandler,
    ProcessEventHandler, ReactivateSubscriptionHandler, RequestOtpHandler,
    StartSubscriptionHandler, UpdateEmailHandler, VerifyOtpHandler,
};
use crate::application::normalizer::EventNormalizer;
use crate::ports::{Mailer, ProcessorGateway, RecordStore, VerificationStore};

/// Shared application state containing all dependencies.
///
/// Cloned per request; dependencies are Arc-wrapped ports.
#[derive(Clone)]
pub struct AppState {
    pub record_store: Arc<dyn RecordStore>,
    pub verification_store: Arc<dyn VerificationStore>,
    pub gateway: Arc<dyn ProcessorGateway>,
    pub mailer: Arc<dyn Mailer>,
    /// Webhook signing secret; `None` means the deployment is misconfigured
    /// and webhook deliveries are answered with a server error.
    pub webhook_secret: Option<SecretString>,
}

impl AppState {
    /// Create handlers on demand from the shared state.
    pub fn process_event_handler(&self) -> ProcessEventHandler {
        ProcessEventHandler::new(
            self.record_store.clone(),
            EventNormalizer::new(self.gateway.clone()),
        )
    }

    pub fn start_subscription_handler(&self) -> StartSubscriptionHandler {
        StartSubscriptionHandler::new(self.record_store.clone(), self.gateway.clone())
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.record_store.clone(), self.gateway.clone())
    }

    pub fn reactivate_subscription_handler(&self) -> ReactivateSubscriptionHandler {
        ReactivateSubscriptionHandler::new(self.record_store.clone(), self.gateway.clone())
    }

    pub fn create_setup_intent_handler(&self) -> CreateSetupIntentHandler {
        CreateSetupIntentHandler::new(self.record_store.clone(), self.gateway.clone())
    }

    pub fn apply_payment_method_handler(&self) -> ApplyPaymentMethodHandler {
        ApplyPaymentMethodHandler::new(self.record_store.clone(), self.gateway.clone())
    }

    pub fn update_email_handler(&self) -> UpdateEmailHandler {
        UpdateEmailHandler::new(self.record_store.clone(), self.gateway.clone())
    }

    pub fn request_otp_handler(&self) -> RequestOtpHandler {
        RequestOtpHandler::new(self.verification_store.clone(), self.mailer.clone())
    }

    pub fn verify_otp_handler(&self) -> VerifyOtpHandler {
        VerifyOtpHandler::new(self.verification_store.clone())
    }
}

/// Builds the complete application router.
pub fn app_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/stripe", billing::routes())
        .nest("/api/email", verification::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

async fn root() -> &'static str {
    "server running..."
}

async fn health() -> &'static str {
    "ok"
}
