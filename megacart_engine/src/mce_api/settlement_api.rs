use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, Principal, Role, VendorSplit},
    events::{EventProducers, OrderPaidEvent},
    gateway::{GatewayError, PaymentGateway},
    helpers::vendor_splits,
    mce_api::MarketConfig,
    notifier,
    order_objects::{PaymentConfirmation, SettlementResult},
    traits::{CreditRetryResult, MarketDatabase, SettlementError},
};

/// `SettlementApi` is the payment callback side of checkout. It verifies the gateway's signature, marks the order
/// paid, splits the proceeds between the platform and each vendor and credits the vendor ledgers.
pub struct SettlementApi<B, G> {
    db: B,
    gateway: G,
    config: MarketConfig,
    producers: EventProducers,
}

impl<B, G> Debug for SettlementApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi (commission {})", self.config.commission)
    }
}

impl<B, G> SettlementApi<B, G>
where
    B: MarketDatabase,
    G: PaymentGateway,
{
    pub fn new(db: B, gateway: G, config: MarketConfig, producers: EventProducers) -> Self {
        Self { db, gateway, config, producers }
    }

    /// Verifies a payment and settles the order.
    ///
    /// Only the buyer's own `Pending` order matching the gateway order id is considered, so replaying a confirmation
    /// for an order that has already been paid returns `OrderNotFound` and credits nobody twice.
    ///
    /// A bad signature fails the order with `VerificationFailed`. Any other gateway problem also fails the order, with
    /// `ProcessingError`. Once the order is `Paid`, the call succeeds even if some vendor credits could not be
    /// applied; those vendors are listed in [`SettlementResult::deferred_vendors`] and picked up by
    /// [`Self::retry_pending_credits`].
    pub async fn verify_and_settle(
        &self,
        principal: &Principal,
        confirmation: PaymentConfirmation,
    ) -> Result<SettlementResult, SettlementError> {
        principal.require_role(Role::Buyer).map_err(SettlementError::PermissionDenied)?;
        let PaymentConfirmation { gateway_order_id, gateway_payment_id, gateway_signature } = confirmation;
        let order = self
            .db
            .fetch_pending_order_for_payment(principal.id, &gateway_order_id)
            .await?
            .ok_or_else(|| SettlementError::OrderNotFound(gateway_order_id.clone()))?;
        let verified =
            self.gateway.verify_signature(&gateway_order_id, &gateway_payment_id, &gateway_signature).await;
        if let Err(e) = verified {
            self.fail_order(&order, principal).await;
            return Err(match e {
                GatewayError::SignatureInvalid => {
                    warn!("💸️ Signature for payment {gateway_payment_id} on order #{} is invalid", order.id);
                    SettlementError::VerificationFailed(e.to_string())
                },
                e => {
                    warn!("💸️ Payment {gateway_payment_id} on order #{} could not be verified. {e}", order.id);
                    SettlementError::ProcessingError(e.to_string())
                },
            });
        }
        let items =
            self.db.fetch_order_items(order.id).await.map_err(|e| SettlementError::DatabaseError(e.to_string()))?;
        let splits = vendor_splits(&items, self.config.commission);
        let order =
            self.db.mark_order_paid(order.id, &gateway_payment_id, &gateway_signature, principal.id, &splits).await?;
        info!("💸️ Order #{} paid ({}). Crediting {} vendors", order.id, order.total_amount, splits.len());
        let deferred_vendors = self.apply_credits_for(&order).await?;
        self.publish_settlement(&order, &splits).await;
        match self.db.clear_active_cart(order.buyer_id).await {
            Ok(n) => trace!("💸️ {n} items removed from the cart of buyer #{}", order.buyer_id),
            Err(e) => warn!("💸️ Could not clear the cart of buyer #{}. {e}", order.buyer_id),
        }
        Ok(SettlementResult { order, splits, deferred_vendors })
    }

    /// Applies every ledger credit still waiting in the outbox. Returns how many were applied and how many failed
    /// again.
    pub async fn retry_pending_credits(&self) -> Result<CreditRetryResult, SettlementError> {
        let credits = self.db.fetch_pending_credits(None).await?;
        let mut result = CreditRetryResult { applied: 0, failed: 0 };
        for credit in credits {
            match self.db.apply_ledger_credit(credit.id).await {
                Ok(true) => result.applied += 1,
                Ok(false) => trace!("💸️ Ledger credit #{} was applied by someone else", credit.id),
                Err(e) => {
                    warn!("💸️ Ledger credit #{} for vendor #{} is still pending. {e}", credit.id, credit.vendor_id);
                    result.failed += 1;
                },
            }
        }
        if result.applied + result.failed > 0 {
            info!("💸️ Ledger credit retry: {} applied, {} still pending", result.applied, result.failed);
        }
        Ok(result)
    }

    async fn fail_order(&self, order: &Order, principal: &Principal) {
        match self.db.mark_order_failed(order.id, principal.id).await {
            Ok(_) => debug!("💸️ Order #{} marked as failed", order.id),
            Err(e) => error!("💸️ Could not mark order #{} as failed. {e}", order.id),
        }
    }

    /// Applies each of the order's pending credits in its own transaction. Returns the vendors whose credit failed.
    async fn apply_credits_for(&self, order: &Order) -> Result<Vec<i64>, SettlementError> {
        let credits = self.db.fetch_pending_credits(Some(order.id)).await?;
        let mut deferred = Vec::new();
        for credit in credits {
            if let Err(e) = self.db.apply_ledger_credit(credit.id).await {
                error!(
                    "💸️ Could not credit vendor #{} for order #{}. The credit stays queued for retry. {e}",
                    credit.vendor_id, order.id
                );
                deferred.push(credit.vendor_id);
            }
        }
        Ok(deferred)
    }

    async fn publish_settlement(&self, order: &Order, splits: &[VendorSplit]) {
        self.producers.publish_order_paid(OrderPaidEvent::new(order.clone(), splits.to_vec())).await;
        for split in splits {
            match self.db.fetch_vendor(split.vendor_id).await {
                Ok(Some(vendor)) => {
                    self.producers.notify(notifier::vendor_new_order(&vendor.email, order, split)).await;
                },
                Ok(None) => warn!("💸️ Vendor #{} not found. No order notification sent", split.vendor_id),
                Err(e) => warn!("💸️ Could not look up vendor #{}. {e}", split.vendor_id),
            }
        }
        match self.db.fetch_user(order.buyer_id).await {
            Ok(Some(buyer)) => self.producers.notify(notifier::buyer_order_paid(&buyer.email, order)).await,
            Ok(None) => warn!("💸️ Buyer #{} not found. No payment receipt sent", order.buyer_id),
            Err(e) => warn!("💸️ Could not look up buyer #{}. {e}", order.buyer_id),
        }
        let summary = notifier::operator_order_summary(&self.config.operator_email, order, splits);
        self.producers.notify(summary).await;
    }
}
