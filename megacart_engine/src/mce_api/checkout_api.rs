use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Principal, Role},
    gateway::PaymentGateway,
    helpers::receipt_for_order,
    mce_api::MarketConfig,
    order_objects::{CheckoutResult, NewOrderRequest},
    traits::{CheckoutError, CheckoutManagement},
};

/// `CheckoutApi` creates provisional orders and the matching payment order at the gateway.
pub struct CheckoutApi<B, G> {
    db: B,
    gateway: G,
    config: MarketConfig,
}

impl<B, G> Debug for CheckoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({})", self.config.currency)
    }
}

impl<B, G> CheckoutApi<B, G>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    pub fn new(db: B, gateway: G, config: MarketConfig) -> Self {
        Self { db, gateway, config }
    }

    /// Places an order for the buyer.
    ///
    /// Stock for every line is reserved and the order is stored as `Pending` in a single transaction. The payment
    /// gateway is then asked for a remote order covering the declared total. If the gateway call fails, or the gateway
    /// order cannot be recorded against the local one, the local order is deleted and its stock released before the
    /// error is returned, so a failed checkout leaves no trace.
    pub async fn create_order(
        &self,
        principal: &Principal,
        request: NewOrderRequest,
    ) -> Result<CheckoutResult, CheckoutError> {
        principal.require_role(Role::Buyer).map_err(CheckoutError::PermissionDenied)?;
        validate_request(&request)?;
        let (order, items) = self
            .db
            .create_pending_order(principal.id, &request.items, &request.shipping_address, request.total_amount)
            .await?;
        debug!("📝️ Order #{} created for {principal} with {} items. Requesting gateway order", order.id, items.len());
        let receipt = receipt_for_order(order.id);
        let remote = match self.gateway.create_remote_order(order.total_amount, &self.config.currency, &receipt).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!("📝️ Gateway order for #{} could not be created. {e}. Discarding the order", order.id);
                self.discard(order.id).await;
                return Err(CheckoutError::GatewayError(e.to_string()));
            },
        };
        let order = match self.db.attach_gateway_order(order.id, &remote.gateway_order_id).await {
            Ok(order) => order,
            Err(e) => {
                warn!(
                    "📝️ Order #{} could not be linked to gateway order {}. {e}. Discarding the order",
                    order.id, remote.gateway_order_id
                );
                self.discard(order.id).await;
                return Err(e);
            },
        };
        info!("📝️ Order #{} awaiting payment on gateway order {}", order.id, remote.gateway_order_id);
        Ok(CheckoutResult {
            order_id: order.id,
            gateway_order_id: remote.gateway_order_id,
            amount: order.total_amount,
            currency: self.config.currency.clone(),
        })
    }

    /// Deletes a provisional order and releases its stock. An unpaid order without a usable gateway link could never
    /// be settled.
    async fn discard(&self, order_id: i64) {
        if let Err(e) = self.db.discard_pending_order(order_id).await {
            error!("📝️ Could not discard order #{order_id}. Its stock stays reserved. {e}");
        }
    }
}

fn validate_request(request: &NewOrderRequest) -> Result<(), CheckoutError> {
    if request.items.is_empty() {
        return Err(CheckoutError::InvalidCheckout("the order has no items".into()));
    }
    if let Some(line) = request.items.iter().find(|l| l.quantity < 1) {
        return Err(CheckoutError::InvalidCheckout(format!(
            "quantity for product {} must be at least 1",
            line.product_id
        )));
    }
    if !request.total_amount.is_positive() {
        return Err(CheckoutError::InvalidCheckout("the order total must be greater than zero".into()));
    }
    if !request.shipping_address.is_complete() {
        return Err(CheckoutError::InvalidCheckout("the shipping address is incomplete".into()));
    }
    Ok(())
}
