//! CancelSubscriptionHandler - schedules cancellation at period end.

use std::sync::Arc;

use crate::application::effects::{execute_effect, EffectOutcome};
use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::subscription::{
    plan_cancel, settle_cancel, SubscriptionError, SubscriptionStatus,
};
use crate::ports::{ProcessorGateway, RecordStore};

/// Command to cancel an account's subscription.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub account_id: AccountId,
}

/// Result of a scheduled cancellation.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    pub status: SubscriptionStatus,
    /// Access continues until this processor-acknowledged period end.
    pub current_period_end: Timestamp,
}

/// Handler for user-initiated cancellation.
///
/// Cancellation takes effect at the end of the current billing period; the
/// deletion event at the boundary finalizes the record to `cancelled`.
pub struct CancelSubscriptionHandler {
    store: Arc<dyn RecordStore>,
    gateway: Arc<dyn ProcessorGateway>,
}

impl CancelSubscriptionHandler {
    pub fn new(store: Arc<dyn RecordStore>, gateway: Arc<dyn ProcessorGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, SubscriptionError> {
        // 1. Load the record.
        let record = self
            .store
            .get(&cmd.account_id)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?
            .ok_or_else(|| SubscriptionError::NotFound(cmd.account_id.clone()))?;

        // 2. Plan: validates the transition and names the processor effect.
        let effect = plan_cancel(&record)?;

        // 3. Execute against the processor.
        let outcome = execute_effect(self.gateway.as_ref(), &effect)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;
        let EffectOutcome::Subscription(ack) = outcome else {
            return Err(SubscriptionError::Upstream(
                "unexpected processor response to cancellation".to_string(),
            ));
        };

        // 4. Settle and persist.
        let period_end = Timestamp::from_unix_seconds(ack.current_period_end);
        let patch = settle_cancel(period_end, Timestamp::now());
        self.store
            .update(&cmd.account_id, &patch)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;

        tracing::info!(
            account_id = %cmd.account_id,
            subscription_id = %ack.id,
            "Cancellation scheduled at period end"
        );

        Ok(CancelSubscriptionResult {
            status: SubscriptionStatus::Cancelling,
            current_period_end: period_end,
        })
    }
}
