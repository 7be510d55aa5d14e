//! VerifyOtpHandler - checks a submitted verification passcode.

use std::sync::Arc;

use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::verification::VerificationError;
use crate::ports::VerificationStore;

/// Command to verify a submitted code.
#[derive(Debug, Clone)]
pub struct VerifyOtpCommand {
    pub account_id: AccountId,
    pub otp: String,
}

/// Result of a successful verification.
#[derive(Debug, Clone)]
pub struct VerifyOtpResult {
    /// The now-verified email address.
    pub email: String,
}

/// Handler for OTP verification.
pub struct VerifyOtpHandler {
    store: Arc<dyn VerificationStore>,
}

impl VerifyOtpHandler {
    pub fn new(store: Arc<dyn VerificationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, cmd: VerifyOtpCommand) -> Result<VerifyOtpResult, VerificationError> {
        if cmd.otp.trim().is_empty() {
            return Err(VerificationError::MissingField("otp"));
        }

        // 1. Load the pending request.
        let mut record = self
            .store
            .get(&cmd.account_id)
            .await
            .map_err(|e| VerificationError::Upstream(e.to_string()))?
            .ok_or(VerificationError::NoPendingRequest)?;

        // 2. Check expiry and code; consumes the code on success.
        record.verify(&cmd.otp, Timestamp::now())?;

        // 3. Persist the verified record.
        self.store
            .set(&record)
            .await
            .map_err(|e| VerificationError::Upstream(e.to_string()))?;

        tracing::info!(account_id = %cmd.account_id, "Email verified");

        Ok(VerifyOtpResult {
            email: record.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryVerificationStore;
    use crate::domain::verification::VerificationRecord;

    fn account() -> AccountId {
        AccountId::new("user-1").unwrap()
    }

    async fn store_with_code(otp: &str) -> Arc<InMemoryVerificationStore> {
        let store = Arc::new(InMemoryVerificationStore::new());
        let record = VerificationRecord::issue(
            account(),
            "a@b.test",
            otp.to_string(),
            Timestamp::now(),
        );
        store.set(&record).await.unwrap();
        store
    }

    #[tokio::test]
    async fn verifies_matching_code() {
        let store = store_with_code("123456").await;
        let handler = VerifyOtpHandler::new(store.clone());

        let result = handler
            .handle(VerifyOtpCommand {
                account_id: account(),
                otp: "123456".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.email, "a@b.test");
        let record = store.get(&account()).await.unwrap().unwrap();
        assert!(record.verified);
        assert!(record.otp.is_none());
    }

    #[tokio::test]
    async fn rejects_wrong_code() {
        let store = store_with_code("123456").await;
        let handler = VerifyOtpHandler::new(store.clone());

        let result = handler
            .handle(VerifyOtpCommand {
                account_id: account(),
                otp: "000000".to_string(),
            })
            .await;

        assert!(matches!(result, Err(VerificationError::InvalidCode)));
        let record = store.get(&account()).await.unwrap().unwrap();
        assert!(!record.verified);
    }

    #[tokio::test]
    async fn rejects_account_without_pending_request() {
        let store = Arc::new(InMemoryVerificationStore::new());
        let handler = VerifyOtpHandler::new(store);

        let result = handler
            .handle(VerifyOtpCommand {
                account_id: account(),
                otp: "123456".to_string(),
            })
            .await;

        assert!(matches!(result, Err(VerificationError::NoPendingRequest)));
    }

    #[tokio::test]
    async fn rejects_blank_code() {
        let store = store_with_code("123456").await;
        let handler = VerifyOtpHandler::new(store);

        let result = handler
            .handle(VerifyOtpCommand {
                account_id: account(),
                otp: "".to_string(),
            })
            .await;

        assert!(matches!(result, Err(VerificationError::MissingField(_))));
    }
}
