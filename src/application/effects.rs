//! Effect execution - interprets reconciliation effects against the gateway.
//!
//! The engine names effects; this module is the single place that turns
//! them into processor calls. Keeping the interpretation here means every
//! handler issues exactly the calls the engine decided on, in order.

use crate::domain::subscription::Effect;
use crate::ports::{
    CustomerUpdate, GatewayError, ProcessorGateway, ProcessorSubscription, SubscriptionUpdate,
};

/// What an executed effect produced.
#[derive(Debug, Clone)]
pub enum EffectOutcome {
    /// The acknowledged subscription state (cancellation schedule changes,
    /// default payment method changes).
    Subscription(ProcessorSubscription),
    /// Customer-side change; the processor's acknowledged email, if any.
    CustomerEmail(Option<String>),
    /// Outcome of the best-effort invoice payment sub-effect.
    InvoicePayment(InvoiceSettlement),
    /// Customer default payment method set; nothing to report.
    Acknowledged,
}

/// Separately reported outcome of the best-effort invoice payment.
///
/// Never escalates to the primary operation's result; callers log it and
/// pass it through to the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceSettlement {
    Paid { invoice_id: String },
    NoOpenInvoice,
    Failed { message: String },
}

/// Executes one effect against the gateway.
///
/// `PayLatestOpenInvoice` reports its failure inside [`InvoiceSettlement`]
/// rather than as an `Err`; every other effect propagates gateway errors.
pub async fn execute_effect(
    gateway: &dyn ProcessorGateway,
    effect: &Effect,
) -> Result<EffectOutcome, GatewayError> {
    match effect {
        Effect::ScheduleCancellation { subscription_id } => {
            let ack = gateway
                .update_subscription(
                    subscription_id,
                    SubscriptionUpdate {
                        cancel_at_period_end: Some(true),
                        ..Default::default()
                    },
                )
                .await?;
            Ok(EffectOutcome::Subscription(ack))
        }
        Effect::ClearScheduledCancellation { subscription_id } => {
            let ack = gateway
                .update_subscription(
                    subscription_id,
                    SubscriptionUpdate {
                        cancel_at_period_end: Some(false),
                        ..Default::default()
                    },
                )
                .await?;
            Ok(EffectOutcome::Subscription(ack))
        }
        Effect::SetCustomerDefaultPaymentMethod {
            customer_id,
            payment_method_id,
        } => {
            gateway
                .update_customer(
                    customer_id,
                    CustomerUpdate {
                        default_payment_method: Some(payment_method_id.clone()),
                        ..Default::default()
                    },
                )
                .await?;
            Ok(EffectOutcome::Acknowledged)
        }
        Effect::SetSubscriptionDefaultPaymentMethod {
            subscription_id,
            payment_method_id,
        } => {
            let ack = gateway
                .update_subscription(
                    subscription_id,
                    SubscriptionUpdate {
                        default_payment_method: Some(payment_method_id.clone()),
                        ..Default::default()
                    },
                )
                .await?;
            Ok(EffectOutcome::Subscription(ack))
        }
        Effect::PayLatestOpenInvoice { customer_id } => {
            let settlement = pay_latest_open_invoice(gateway, customer_id).await;
            Ok(EffectOutcome::InvoicePayment(settlement))
        }
        Effect::UpdateCustomerEmail { customer_id, email } => {
            let customer = gateway
                .update_customer(
                    customer_id,
                    CustomerUpdate {
                        email: Some(email.clone()),
                        ..Default::default()
                    },
                )
                .await?;
            Ok(EffectOutcome::CustomerEmail(customer.email))
        }
    }
}

/// Fetches the most recent invoice and pays it if open. All failures fold
/// into the settlement report.
async fn pay_latest_open_invoice(
    gateway: &dyn ProcessorGateway,
    customer_id: &str,
) -> InvoiceSettlement {
    let latest = match gateway.list_invoices(customer_id, 1).await {
        Ok(invoices) => invoices.into_iter().next(),
        Err(e) => {
            return InvoiceSettlement::Failed {
                message: e.to_string(),
            }
        }
    };

    let Some(invoice) = latest else {
        return InvoiceSettlement::NoOpenInvoice;
    };
    if !invoice.is_open() {
        return InvoiceSettlement::NoOpenInvoice;
    }

    match gateway.pay_invoice(&invoice.id).await {
        Ok(paid) => InvoiceSettlement::Paid {
            invoice_id: paid.id,
        },
        Err(e) => InvoiceSettlement::Failed {
            message: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Invoice;
    use crate::test_utils::MockGateway;

    fn open_invoice(id: &str) -> Invoice {
        Invoice {
            id: id.to_string(),
            customer_id: "cus_1".to_string(),
            subscription_id: Some("sub_1".to_string()),
            status: "open".to_string(),
            created: 1000,
            amount_paid: 0,
            amount_due: 1999,
            invoice_pdf: None,
        }
    }

    #[tokio::test]
    async fn schedule_cancellation_sets_flag_on_processor() {
        let gateway = MockGateway::new();
        let effect = Effect::ScheduleCancellation {
            subscription_id: "sub_1".to_string(),
        };

        let outcome = execute_effect(&gateway, &effect).await.unwrap();

        assert!(matches!(outcome, EffectOutcome::Subscription(_)));
        assert_eq!(
            gateway.calls(),
            vec!["update_subscription:sub_1:Some(true):None"]
        );
    }

    #[tokio::test]
    async fn pay_latest_open_invoice_pays_open_invoice() {
        let gateway = MockGateway::new().with_invoices(vec![open_invoice("in_7")]);
        let effect = Effect::PayLatestOpenInvoice {
            customer_id: "cus_1".to_string(),
        };

        let outcome = execute_effect(&gateway, &effect).await.unwrap();

        assert!(matches!(
            outcome,
            EffectOutcome::InvoicePayment(InvoiceSettlement::Paid { ref invoice_id }) if invoice_id == "in_7"
        ));
    }

    #[tokio::test]
    async fn pay_latest_open_invoice_skips_paid_invoice() {
        let mut paid = open_invoice("in_7");
        paid.status = "paid".to_string();
        let gateway = MockGateway::new().with_invoices(vec![paid]);

        let outcome = execute_effect(
            &gateway,
            &Effect::PayLatestOpenInvoice {
                customer_id: "cus_1".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            outcome,
            EffectOutcome::InvoicePayment(InvoiceSettlement::NoOpenInvoice)
        ));
        // No pay call was made.
        assert_eq!(gateway.calls(), vec!["list_invoices:cus_1:1"]);
    }

    #[tokio::test]
    async fn pay_failure_folds_into_settlement() {
        let gateway = MockGateway::new().with_invoices(vec![open_invoice("in_7")]).failing("pay_invoice");

        let outcome = execute_effect(
            &gateway,
            &Effect::PayLatestOpenInvoice {
                customer_id: "cus_1".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            outcome,
            EffectOutcome::InvoicePayment(InvoiceSettlement::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn update_email_reports_acknowledged_address() {
        let gateway = MockGateway::new();
        let effect = Effect::UpdateCustomerEmail {
            customer_id: "cus_1".to_string(),
            email: "new@example.test".to_string(),
        };

        let outcome = execute_effect(&gateway, &effect).await.unwrap();

        assert!(matches!(
            outcome,
            EffectOutcome::CustomerEmail(Some(ref email)) if email == "new@example.test"
        ));
    }
}
