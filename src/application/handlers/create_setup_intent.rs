//! CreateSetupIntentHandler - starts collection of a new payment method.

use std::sync::Arc;

use crate::domain::foundation::AccountId;
use crate::domain::subscription::SubscriptionError;
use crate::ports::{ProcessorGateway, RecordStore};

/// Command to create a setup intent for an account.
#[derive(Debug, Clone)]
pub struct CreateSetupIntentCommand {
    pub account_id: AccountId,
}

/// Client secret for completing card collection.
#[derive(Debug, Clone)]
pub struct CreateSetupIntentResult {
    pub client_secret: String,
    pub customer_id: String,
}

/// Handler for setup-intent creation.
///
/// The setup intent collects card details off-session; the collected
/// payment method is applied in a second step.
pub struct CreateSetupIntentHandler {
    store: Arc<dyn RecordStore>,
    gateway: Arc<dyn ProcessorGateway>,
}

impl CreateSetupIntentHandler {
    pub fn new(store: Arc<dyn RecordStore>, gateway: Arc<dyn ProcessorGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn handle(
        &self,
        cmd: CreateSetupIntentCommand,
    ) -> Result<CreateSetupIntentResult, SubscriptionError> {
        // 1. Load the record; a processor customer must exist.
        let record = self
            .store
            .get(&cmd.account_id)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?
            .ok_or_else(|| SubscriptionError::NotFound(cmd.account_id.clone()))?;

        let customer_id = record.customer_id.ok_or_else(|| {
            SubscriptionError::InvalidTransition("no processor customer on record".to_string())
        })?;

        // 2. Create the off-session setup intent.
        let setup_intent = self
            .gateway
            .create_setup_intent(&customer_id)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;

        tracing::info!(
            account_id = %cmd.account_id,
            setup_intent_id = %setup_intent.id,
            "Setup intent created"
        );

        Ok(CreateSetupIntentResult {
            client_secret: setup_intent.client_secret,
            customer_id,
        })
    }
}
