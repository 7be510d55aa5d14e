//! ProcessEventHandler - reconciles one inbound processor event.

use std::sync::Arc;

use crate::application::normalizer::{EventNormalizer, NormalizedEvent};
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{
    reconcile_event, PaymentFailurePolicy, ReconcileOutcome, SubscriptionError, WebhookEnvelope,
};
use crate::ports::RecordStore;

/// Command carrying one verified webhook envelope.
#[derive(Debug, Clone)]
pub struct ProcessEventCommand {
    pub envelope: WebhookEnvelope,
}

/// What processing the event did to the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEventResult {
    /// The patch was merged into the account's record.
    Applied { account_id: String },
    /// A handled event type that produced no change (stale, one-off invoice).
    Ignored { reason: String },
    /// An event type this service does not process.
    Unhandled { event_type: String },
}

/// Handler for inbound processor events.
///
/// Safe under redelivery: reconciliation is a field-level overwrite and the
/// store write is a partial merge, so replaying any event is a no-op or an
/// identical write.
pub struct ProcessEventHandler {
    store: Arc<dyn RecordStore>,
    normalizer: EventNormalizer,
    policy: PaymentFailurePolicy,
}

impl ProcessEventHandler {
    pub fn new(store: Arc<dyn RecordStore>, normalizer: EventNormalizer) -> Self {
        Self {
            store,
            normalizer,
            policy: PaymentFailurePolicy::default(),
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessEventCommand,
    ) -> Result<ProcessEventResult, SubscriptionError> {
        // 1. Normalize: resolve the owning account and the typed payload.
        let event = match self.normalizer.normalize(&cmd.envelope).await? {
            NormalizedEvent::Handled(event) => event,
            NormalizedEvent::Unhandled {
                event_id,
                event_type,
            } => {
                tracing::info!(event_id = %event_id, event_type = %event_type, "Unhandled event type, acknowledging");
                return Ok(ProcessEventResult::Unhandled { event_type });
            }
        };

        // 2. Load the record; events for unknown accounts are a hard error,
        // never a silent create.
        let record = self
            .store
            .get(&event.account_id)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?
            .ok_or_else(|| SubscriptionError::NotFound(event.account_id.clone()))?;

        // 3. Reconcile.
        match reconcile_event(&record, &event, self.policy, Timestamp::now()) {
            ReconcileOutcome::Apply(patch) => {
                self.store
                    .update(&event.account_id, &patch)
                    .await
                    .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;
                tracing::info!(
                    event_id = %event.event_id,
                    account_id = %event.account_id,
                    "Event reconciled"
                );
                Ok(ProcessEventResult::Applied {
                    account_id: event.account_id.to_string(),
                })
            }
            ReconcileOutcome::Ignored(reason) => {
                let reason = reason.describe();
                tracing::info!(
                    event_id = %event.event_id,
                    account_id = %event.account_id,
                    reason = %reason,
                    "Event ignored"
                );
                Ok(ProcessEventResult::Ignored { reason })
            }
        }
    }
}
