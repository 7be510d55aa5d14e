//! Subscription domain module.
//!
//! Holds the subscription record, the processor event model, and the
//! reconciliation engine that drives every state transition.
//!
//! # Module Structure
//!
//! - `record` - SubscriptionRecord and partial-field patches
//! - `status` - SubscriptionStatus state machine
//! - `event` - raw webhook envelope and the canonical event union
//! - `engine` - pure reconciliation decisions and processor effects
//! - `errors` - SubscriptionError taxonomy

mod engine;
mod errors;
mod event;
mod record;
mod status;

pub use engine::{
    plan_cancel, plan_reactivate, plan_update_email, plan_update_payment_method, reconcile_event,
    settle_cancel, settle_payment_method, settle_reactivate, Effect, IgnoreReason,
    PaymentFailurePolicy, ReconcileOutcome,
};
pub use errors::SubscriptionError;
pub use event::{
    CanonicalEvent, EventKind, InvoiceSnapshot, SubscriptionSnapshot, WebhookEnvelope,
    WebhookEventType,
};
pub use record::{RecordPatch, SubscriptionRecord, Update};
pub use status::SubscriptionStatus;
