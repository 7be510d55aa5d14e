//! Recording mailer double.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{MailError, Mailer, OutboundEmail};

/// Mailer that records messages instead of sending them.
#[derive(Default)]
pub struct MockMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    fail: bool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError("scripted delivery failure".to_string()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}
