//! StartSubscriptionHandler - initiates the payment-sheet flow.

use std::sync::Arc;

use crate::domain::foundation::AccountId;
use crate::domain::subscription::{SubscriptionError, SubscriptionRecord};
use crate::ports::{CreateCustomerRequest, ProcessorGateway, RecordStore};

/// Command to start a subscription for an account.
#[derive(Debug, Clone)]
pub struct StartSubscriptionCommand {
    pub account_id: AccountId,
    pub price_id: String,
    pub email: String,
}

/// Client-side secrets for completing the payment sheet.
#[derive(Debug, Clone)]
pub struct StartSubscriptionResult {
    pub payment_intent_client_secret: Option<String>,
    pub ephemeral_key_secret: String,
    pub customer_id: String,
    pub subscription_id: String,
}

/// Handler for payment-sheet initiation.
///
/// Provisions the processor customer (with the account identifier in its
/// metadata - the attribute every inbound event resolves against), creates
/// the incomplete subscription, and writes the initial `pending` record.
pub struct StartSubscriptionHandler {
    store: Arc<dyn RecordStore>,
    gateway: Arc<dyn ProcessorGateway>,
}

impl StartSubscriptionHandler {
    pub fn new(store: Arc<dyn RecordStore>, gateway: Arc<dyn ProcessorGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn handle(
        &self,
        cmd: StartSubscriptionCommand,
    ) -> Result<StartSubscriptionResult, SubscriptionError> {
        // 1. Create the processor customer with uid metadata.
        let customer = self
            .gateway
            .create_customer(CreateCustomerRequest {
                account_id: cmd.account_id.clone(),
                email: cmd.email.clone(),
                name: Some(format!("User-{}", cmd.account_id)),
            })
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;

        // 2. Ephemeral key for client-side customer access.
        let ephemeral_key = self
            .gateway
            .create_ephemeral_key(&customer.id)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;

        // 3. Incomplete subscription; payment completes client-side.
        let new_subscription = self
            .gateway
            .create_subscription(&customer.id, &cmd.price_id)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;

        // 4. Initial pending record. The creation event will activate it.
        let record = SubscriptionRecord::pending(
            cmd.account_id,
            &customer.id,
            &new_subscription.subscription.id,
            &cmd.price_id,
        );
        self.store
            .set(&record)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;

        tracing::info!(
            account_id = %record.account_id,
            customer_id = %customer.id,
            subscription_id = %new_subscription.subscription.id,
            "Payment sheet initiated"
        );

        Ok(StartSubscriptionResult {
            payment_intent_client_secret: new_subscription.payment_intent_client_secret,
            ephemeral_key_secret: ephemeral_key.secret,
            customer_id: customer.id,
            subscription_id: new_subscription.subscription.id,
        })
    }
}
