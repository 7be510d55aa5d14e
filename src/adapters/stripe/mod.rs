//! Stripe adapter - processor gateway and webhook verification.

mod gateway;
mod types;
mod webhook_verifier;

pub use gateway::{StripeConfig, StripeGateway};
pub use webhook_verifier::{sign_for_tests, SignatureHeader, VerifyError, WebhookVerifier};
