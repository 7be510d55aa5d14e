//! UpdateEmailHandler - changes the processor-side billing email.

use std::sync::Arc;

use crate::application::effects::{execute_effect, EffectOutcome};
use crate::domain::foundation::AccountId;
use crate::domain::subscription::{plan_update_email, SubscriptionError};
use crate::ports::{ProcessorGateway, RecordStore};

/// Command to update an account's billing email.
#[derive(Debug, Clone)]
pub struct UpdateEmailCommand {
    pub account_id: AccountId,
    pub new_email: String,
}

/// Result of the email change.
#[derive(Debug, Clone)]
pub struct UpdateEmailResult {
    /// Email the processor acknowledged.
    pub billing_email: String,
}

/// Handler for billing-email changes.
///
/// Email lives processor-side only; the subscription record is untouched.
pub struct UpdateEmailHandler {
    store: Arc<dyn RecordStore>,
    gateway: Arc<dyn ProcessorGateway>,
}

impl UpdateEmailHandler {
    pub fn new(store: Arc<dyn RecordStore>, gateway: Arc<dyn ProcessorGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn handle(
        &self,
        cmd: UpdateEmailCommand,
    ) -> Result<UpdateEmailResult, SubscriptionError> {
        if cmd.new_email.trim().is_empty() || !cmd.new_email.contains('@') {
            return Err(SubscriptionError::Validation(
                "a valid email address is required".to_string(),
            ));
        }

        // 1. Load the record; a processor customer must exist.
        let record = self
            .store
            .get(&cmd.account_id)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?
            .ok_or_else(|| SubscriptionError::NotFound(cmd.account_id.clone()))?;

        // 2. Plan and execute the customer update.
        let effect = plan_update_email(&record, &cmd.new_email)?;
        let outcome = execute_effect(self.gateway.as_ref(), &effect)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;

        let billing_email = match outcome {
            EffectOutcome::CustomerEmail(Some(email)) => email,
            _ => cmd.new_email.clone(),
        };

        tracing::info!(
            account_id = %cmd.account_id,
            "Billing email updated"
        );

        Ok(UpdateEmailResult { billing_email })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRecordStore;
    use crate::domain::subscription::SubscriptionRecord;
    use crate::test_utils::MockGateway;

    fn account() -> AccountId {
        AccountId::new("user-1").unwrap()
    }

    async fn store_with_record() -> Arc<InMemoryRecordStore> {
        let record = SubscriptionRecord::pending(account(), "cus_1", "sub_1", "price_1");
        Arc::new(InMemoryRecordStore::with_record(record).await)
    }

    #[tokio::test]
    async fn updates_processor_email_without_touching_record() {
        let store = store_with_record().await;
        let before = store.get(&account()).await.unwrap().unwrap();
        let gateway = Arc::new(MockGateway::new());
        let handler = UpdateEmailHandler::new(store.clone(), gateway.clone());

        let result = handler
            .handle(UpdateEmailCommand {
                account_id: account(),
                new_email: "new@example.test".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.billing_email, "new@example.test");
        assert_eq!(
            gateway.calls(),
            vec!["update_customer:cus_1:Some(\"new@example.test\"):None"]
        );
        // Record unchanged.
        let after = store.get(&account()).await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn rejects_malformed_email() {
        let store = store_with_record().await;
        let handler = UpdateEmailHandler::new(store, Arc::new(MockGateway::new()));

        let result = handler
            .handle(UpdateEmailCommand {
                account_id: account(),
                new_email: "not-an-email".to_string(),
            })
            .await;

        assert!(matches!(result, Err(SubscriptionError::Validation(_))));
    }

    #[tokio::test]
    async fn rejects_record_without_customer() {
        let mut record = SubscriptionRecord::pending(account(), "cus_1", "sub_1", "price_1");
        record.customer_id = None;
        let store = Arc::new(InMemoryRecordStore::with_record(record).await);
        let handler = UpdateEmailHandler::new(store, Arc::new(MockGateway::new()));

        let result = handler
            .handle(UpdateEmailCommand {
                account_id: account(),
                new_email: "new@example.test".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(SubscriptionError::InvalidTransition(_))
        ));
    }
}
