use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderStatusType, Principal, Role},
    events::{EventProducers, OrderStatusChangedEvent},
    notifier,
    traits::{CatalogManagement, OrderFlowError, OrderManagement},
};

/// `FulfilmentApi` lets vendors move paid orders on to `Shipped` and `Delivered`.
pub struct FulfilmentApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for FulfilmentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FulfilmentApi")
    }
}

impl<B> FulfilmentApi<B>
where B: OrderManagement + CatalogManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    /// Moves an order to `new_status` on behalf of a vendor.
    ///
    /// The vendor must have sold at least one item in the order. Only `Paid → Shipped` (which needs a tracking number)
    /// and `Shipped → Delivered` are available here; `Paid` and `Failed` are reached through settlement only.
    pub async fn update_order_status(
        &self,
        principal: &Principal,
        order_id: i64,
        new_status: OrderStatusType,
        tracking_number: Option<String>,
    ) -> Result<Order, OrderFlowError> {
        principal.require_role(Role::Vendor).map_err(OrderFlowError::PermissionDenied)?;
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let items = self.db.fetch_order_items(order_id).await?;
        if !items.iter().any(|i| i.vendor_id == principal.id) {
            return Err(OrderFlowError::PermissionDenied(format!(
                "{principal} has no items in order #{order_id}"
            )));
        }
        let vendor_driven = matches!(new_status, OrderStatusType::Shipped | OrderStatusType::Delivered);
        if !vendor_driven || !order.status.can_transition_to(new_status) {
            return Err(OrderFlowError::InvalidTransition { from: order.status, to: new_status });
        }
        let tracking_number = tracking_number.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        if new_status == OrderStatusType::Shipped && tracking_number.is_none() {
            return Err(OrderFlowError::TrackingNumberRequired);
        }
        let old_status = order.status;
        let updated =
            self.db.transition_order(order_id, old_status, new_status, principal.id, tracking_number.as_deref()).await?;
        info!("📝️ {principal} moved order #{order_id} from {old_status} to {new_status}");
        self.notify_buyer(&updated).await;
        self.producers.publish_order_status_changed(OrderStatusChangedEvent::new(updated.clone(), old_status)).await;
        Ok(updated)
    }

    async fn notify_buyer(&self, order: &Order) {
        match self.db.fetch_user(order.buyer_id).await {
            Ok(Some(buyer)) => self.producers.notify(notifier::buyer_status_update(&buyer.email, order)).await,
            Ok(None) => warn!("📝️ Buyer #{} not found. No status update sent", order.buyer_id),
            Err(e) => warn!("📝️ Could not look up buyer #{}. {e}", order.buyer_id),
        }
    }
}
