//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `RecordStore` - subscription record persistence with partial merge
//! - `VerificationStore` - email-verification record persistence
//! - `ProcessorGateway` - the payment processor's API surface
//! - `Mailer` - outbound transactional email

mod mailer;
mod processor_gateway;
mod record_store;
mod verification_store;

pub use mailer::{MailError, Mailer, OutboundEmail};
pub use processor_gateway::{
    CreateCustomerRequest, Customer, CustomerUpdate, EphemeralKey, GatewayError, GatewayErrorCode,
    Invoice, NewSubscription, ProcessorGateway, ProcessorSubscription, SetupIntent,
    SubscriptionUpdate,
};
pub use record_store::{RecordStore, StoreError};
pub use verification_store::VerificationStore;
