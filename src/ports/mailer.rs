//! Mailer port for outbound transactional email.

use async_trait::async_trait;
use thiserror::Error;

/// A single outbound message.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Errors from mail delivery.
#[derive(Debug, Clone, Error)]
#[error("Mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Port for sending transactional email (verification passcodes).
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}
