//! ApplyPaymentMethodHandler - makes a collected payment method the default.

use std::sync::Arc;

use crate::application::effects::{execute_effect, EffectOutcome, InvoiceSettlement};
use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::subscription::{
    plan_update_payment_method, settle_payment_method, Effect, SubscriptionError,
    SubscriptionStatus,
};
use crate::ports::{ProcessorGateway, RecordStore};

/// Command to apply a payment method to an account's subscription.
#[derive(Debug, Clone)]
pub struct ApplyPaymentMethodCommand {
    pub account_id: AccountId,
    pub payment_method_id: String,
}

/// Result of applying the payment method.
#[derive(Debug, Clone)]
pub struct ApplyPaymentMethodResult {
    /// Status the processor acknowledged on the subscription update.
    pub status: SubscriptionStatus,
    pub payment_method_id: String,
    /// Outcome of the best-effort invoice payment; informational only.
    pub invoice_settlement: InvoiceSettlement,
}

/// Handler for the payment-method change.
///
/// Three processor effects in order: customer default, subscription
/// default, then a best-effort attempt to pay the most recent open
/// invoice. The invoice payment never fails the operation; its outcome is
/// logged and reported alongside the primary result. The record is patched
/// regardless of that outcome.
pub struct ApplyPaymentMethodHandler {
    store: Arc<dyn RecordStore>,
    gateway: Arc<dyn ProcessorGateway>,
}

impl ApplyPaymentMethodHandler {
    pub fn new(store: Arc<dyn RecordStore>, gateway: Arc<dyn ProcessorGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn handle(
        &self,
        cmd: ApplyPaymentMethodCommand,
    ) -> Result<ApplyPaymentMethodResult, SubscriptionError> {
        // 1. Load the record.
        let record = self
            .store
            .get(&cmd.account_id)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?
            .ok_or_else(|| SubscriptionError::NotFound(cmd.account_id.clone()))?;

        // 2. Plan the ordered effects.
        let effects = plan_update_payment_method(&record, &cmd.payment_method_id)?;

        // 3. Execute. Only the invoice payment is best-effort.
        let mut acknowledged_status = record.status;
        let mut settlement = InvoiceSettlement::NoOpenInvoice;
        for effect in &effects {
            match execute_effect(self.gateway.as_ref(), effect).await {
                Ok(EffectOutcome::Subscription(ack)) => {
                    acknowledged_status = SubscriptionStatus::from_processor(&ack.status);
                }
                Ok(EffectOutcome::InvoicePayment(outcome)) => {
                    if let InvoiceSettlement::Failed { message } = &outcome {
                        tracing::warn!(
                            account_id = %cmd.account_id,
                            error = %message,
                            "Best-effort invoice payment failed"
                        );
                    }
                    settlement = outcome;
                }
                Ok(_) => {}
                Err(e) if matches!(effect, Effect::PayLatestOpenInvoice { .. }) => {
                    // The invoice payment must stay non-fatal on every path.
                    settlement = InvoiceSettlement::Failed {
                        message: e.to_string(),
                    };
                }
                Err(e) => return Err(SubscriptionError::Upstream(e.to_string())),
            }
        }

        // 4. Persist the payment method regardless of the settlement.
        let patch = settle_payment_method(&cmd.payment_method_id, Timestamp::now());
        self.store
            .update(&cmd.account_id, &patch)
            .await
            .map_err(|e| SubscriptionError::Upstream(e.to_string()))?;

        tracing::info!(
            account_id = %cmd.account_id,
            payment_method_id = %cmd.payment_method_id,
            "Payment method updated"
        );

        Ok(ApplyPaymentMethodResult {
            status: acknowledged_status,
            payment_method_id: cmd.payment_method_id,
            invoice_settlement: settlement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRecordStore;
    use crate::domain::subscription::SubscriptionRecord;
    use crate::ports::Invoice;
    use crate::test_utils::MockGateway;

    fn account() -> AccountId {
        AccountId::new("user-1").unwrap()
    }

    async fn active_store() -> Arc<InMemoryRecordStore> {
        let mut record = SubscriptionRecord::pending(account(), "cus_1", "sub_1", "price_1");
        record.status = SubscriptionStatus::Active;
        Arc::new(InMemoryRecordStore::with_record(record).await)
    }

    fn open_invoice() -> Invoice {
        Invoice {
            id: "in_1".to_string(),
            customer_id: "cus_1".to_string(),
            subscription_id: Some("sub_1".to_string()),
            status: "open".to_string(),
            created: 1000,
            amount_paid: 0,
            amount_due: 1999,
            invoice_pdf: None,
        }
    }

    fn command() -> ApplyPaymentMethodCommand {
        ApplyPaymentMethodCommand {
            account_id: account(),
            payment_method_id: "pm_9".to_string(),
        }
    }

    #[tokio::test]
    async fn applies_method_and_pays_open_invoice() {
        let store = active_store().await;
        let gateway = Arc::new(MockGateway::new().with_invoices(vec![open_invoice()]));
        let handler = ApplyPaymentMethodHandler::new(store.clone(), gateway.clone());

        let result = handler.handle(command()).await.unwrap();

        assert_eq!(result.payment_method_id, "pm_9");
        assert_eq!(
            result.invoice_settlement,
            InvoiceSettlement::Paid {
                invoice_id: "in_1".to_string()
            }
        );

        let record = store.get(&account()).await.unwrap().unwrap();
        assert_eq!(record.payment_method_id.as_deref(), Some("pm_9"));
        assert!(record.payment_method_updated_at.is_some());

        // Customer default, then subscription default, then invoice flow.
        assert_eq!(
            gateway.calls(),
            vec![
                "update_customer:cus_1:None:Some(\"pm_9\")",
                "update_subscription:sub_1:None:Some(\"pm_9\")",
                "list_invoices:cus_1:1",
                "pay_invoice:in_1",
            ]
        );
    }

    #[tokio::test]
    async fn invoice_payment_failure_does_not_fail_operation() {
        let store = active_store().await;
        let gateway = Arc::new(
            MockGateway::new()
                .with_invoices(vec![open_invoice()])
                .failing("pay_invoice"),
        );
        let handler = ApplyPaymentMethodHandler::new(store.clone(), gateway);

        let result = handler.handle(command()).await.unwrap();

        assert!(matches!(
            result.invoice_settlement,
            InvoiceSettlement::Failed { .. }
        ));
        // Payment method persisted regardless.
        let record = store.get(&account()).await.unwrap().unwrap();
        assert_eq!(record.payment_method_id.as_deref(), Some("pm_9"));
    }

    #[tokio::test]
    async fn primary_effect_failure_propagates() {
        let store = active_store().await;
        let gateway = Arc::new(MockGateway::new().failing("update_customer"));
        let handler = ApplyPaymentMethodHandler::new(store.clone(), gateway);

        let result = handler.handle(command()).await;

        assert!(matches!(result, Err(SubscriptionError::Upstream(_))));
        let record = store.get(&account()).await.unwrap().unwrap();
        assert!(record.payment_method_id.is_none());
    }

    #[tokio::test]
    async fn rejects_record_missing_subscription_or_customer() {
        let mut record = SubscriptionRecord::pending(account(), "cus_1", "sub_1", "price_1");
        record.subscription_id = None;
        let store = Arc::new(InMemoryRecordStore::with_record(record).await);
        let handler = ApplyPaymentMethodHandler::new(store, Arc::new(MockGateway::new()));

        let result = handler.handle(command()).await;
        assert!(matches!(
            result,
            Err(SubscriptionError::InvalidTransition(_))
        ));
    }
}
