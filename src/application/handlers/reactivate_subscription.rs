//! ReactivateSubscriptionHandler - clears a scheduled cancellation.

use std::sync::Arc;

use crate::application::effects::{execute_effect, EffectOutcome};
use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::subscription::{
    plan_reactivate, settle_reactivate, SubscriptionError, SubscriptionStatus,
};
use crate::ports::{ProcessorGateway, RecordStore};

/// Command to reactivate an account's cancelling subscription.
#[derive(Debug, Clone)]
pub struct ReactivateSubscriptionCommand {
    pub account_id: AccountId,
}

/// Result of a reactivation.
#[derive(Debug, Clone)]
pub struct ReactivateSubscriptionResult {
    /// Processor-adopted status after clearing the cancellation.
    pub status: SubscriptionStatus,
    pub current_period_end: Timestamp,
}

/// Handler for user-initiated reactivation.
///
/// Only a subscription still pending cancellation can be reactivated;
/// anything else is an invalid transition.
pub struct ReactivateSubscriptionHandler {
    store: Arc<dyn RecordStore>,
    gateway: Arc<dyn ProcessorGateway>,
}

impl ReactivateSubscriptionHandler {
    pub fn new(store: Arc<dyn RecordStore>, gateway: Arc<dyn ProcessorGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn handle(
        &self,
        cmd: ReactivateSubscriptionCommand,
    ) -> Result<ReactivateSubscriptionResult, SubscriptionError> {
        // 1. Load the record.
        let record = self
            .store
            .get(&cmd.account_id)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?
            .ok_or_else(|| SubscriptionError::NotFound(cmd.account_id.clone()))?;

        // 2. Plan: rejects unless cancel_at_period_end is set.
        let effect = plan_reactivate(&record)?;

        // 3. Execute against the processor.
        let outcome = execute_effect(self.gateway.as_ref(), &effect)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;
        let EffectOutcome::Subscription(ack) = outcome else {
            return Err(SubscriptionError::Upstream(
                "unexpected processor response to reactivation".to_string(),
            ));
        };

        // 4. Settle and persist; adopts the processor-returned status.
        let patch = settle_reactivate(&ack.status);
        self.store
            .update(&cmd.account_id, &patch)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;

        tracing::info!(
            account_id = %cmd.account_id,
            subscription_id = %ack.id,
            status = %ack.status,
            "Subscription reactivated"
        );

        Ok(ReactivateSubscriptionResult {
            status: SubscriptionStatus::from_processor(&ack.status),
            current_period_end: Timestamp::from_unix_seconds(ack.current_period_end),
        })
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

    async fn cancelling_store() -> Arc<InMemoryRecordStore> {
        let mut record = SubscriptionRecord::pending(account(), "cus_1", "sub_1", "price_1");
        record.status = SubscriptionStatus::Cancelling;
        record.cancel_at_period_end = true;
        record.cancelled_at = Some(Timestamp::from_unix_seconds(1500));
        Arc::new(InMemoryRecordStore::with_record(record).await)
    }

    #[tokio::test]
    async fn reactivates_cancelling_subscription() {
        let store = cancelling_store().await;
        let gateway = Arc::new(MockGateway::new().acknowledging_status("active"));
        let handler = ReactivateSubscriptionHandler::new(store.clone(), gateway.clone());

        let result = handler
            .handle(ReactivateSubscriptionCommand {
                account_id: account(),
            })
            .await
            .unwrap();

        assert_eq!(result.status, SubscriptionStatus::Active);

        let record = store.get(&account()).await.unwrap().unwrap();
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert!(!record.cancel_at_period_end);
        assert!(record.cancelled_at.is_none());

        assert_eq!(
            gateway.calls(),
            vec!["update_subscription:sub_1:Some(false):None"]
        );
    }

    #[tokio::test]
    async fn rejects_subscription_not_pending_cancellation() {
        let mut record = SubscriptionRecord::pending(account(), "cus_1", "sub_1", "price_1");
        record.status = SubscriptionStatus::Active;
        let store = Arc::new(InMemoryRecordStore::with_record(record).await);
        let gateway = Arc::new(MockGateway::new());
        let handler = ReactivateSubscriptionHandler::new(store, gateway.clone());

        let result = handler
            .handle(ReactivateSubscriptionCommand {
                account_id: account(),
            })
            .await;

        assert!(matches!(
            result,
            Err(SubscriptionError::InvalidTransition(_))
        ));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn fails_with_not_found_for_unknown_account() {
        let store = Arc::new(InMemoryRecordStore::new());
        let handler =
            ReactivateSubscriptionHandler::new(store, Arc::new(MockGateway::new()));

        let result = handler
            .handle(ReactivateSubscriptionCommand {
                account_id: account(),
            })
            .await;

        assert!(matches!(result, Err(SubscriptionError::NotFound(_))));
    }
}
