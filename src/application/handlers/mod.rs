//! Command handlers - one per operation.
//!
//! # Module Structure
//!
//! - `process_event` - inbound webhook reconciliation
//! - `start_subscription` - payment-sheet initiation
//! - `cancel_subscription` / `reactivate_subscription` - lifecycle actions
//! - `create_setup_intent` / `apply_payment_method` - payment method change
//! - `update_email` - billing email change
//! - `request_otp` / `verify_otp` - email verification

mod apply_payment_method;
mod cancel_subscription;
mod create_setup_intent;
mod process_event;
mod reactivate_subscription;
mod request_otp;
mod start_subscription;
mod update_email;
mod verify_otp;

pub use apply_payment_method::{
    ApplyPaymentMethodCommand, ApplyPaymentMethodHandler, ApplyPaymentMethodResult,
};
pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use create_setup_intent::{
    CreateSetupIntentCommand, CreateSetupIntentHandler, CreateSetupIntentResult,
};
pub use process_event::{ProcessEventCommand, ProcessEventHandler, ProcessEventResult};
pub use reactivate_subscription::{
    ReactivateSubscriptionCommand, ReactivateSubscriptionHandler, ReactivateSubscriptionResult,
};
pub use request_otp::{RequestOtpCommand, RequestOtpHandler, RequestOtpResult};
pub use start_subscription::{
    StartSubscriptionCommand, StartSubscriptionHandler, StartSubscriptionResult,
};
pub use update_email::{UpdateEmailCommand, UpdateEmailHandler, UpdateEmailResult};
pub use verify_otp::{VerifyOtpCommand, VerifyOtpHandler, VerifyOtpResult};
