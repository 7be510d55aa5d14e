//! Axum router for the email-verification endpoints.

use axum::routing::post;
use axum::Router;

use super::super::AppState;
use super::handlers::{request_otp, verify_otp};

/// Verification routes, mounted at `/api/email`.
///
/// - `POST /request-otp` - issue a verification code
/// - `POST /verify-otp` - verify a submitted code
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/request-otp", post(request_otp))
        .route("/verify-otp", post(verify_otp))
}
