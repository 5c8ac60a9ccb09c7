use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, Payout, VendorSplit};

/// Emitted once an order has been marked paid, with the per-vendor split of the proceeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub splits: Vec<VendorSplit>,
}

impl OrderPaidEvent {
    pub fn new(order: Order, splits: Vec<VendorSplit>) -> Self {
        Self { order, splits }
    }
}

/// Emitted for vendor-driven fulfilment transitions (`Shipped`, `Delivered`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatusType,
    pub new_status: OrderStatusType,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, old_status: OrderStatusType) -> Self {
        let new_status = order.status;
        Self { order, old_status, new_status }
    }
}

/// Emitted when a payout is requested or resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutEvent {
    pub payout: Payout,
}

impl PayoutEvent {
    pub fn new(payout: Payout) -> Self {
        Self { payout }
    }
}

/// An outbound message for the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new<S: Into<String>>(recipient: S, subject: S, body: S) -> Self {
        Self { recipient: recipient.into(), subject: subject.into(), body: body.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderPaid(OrderPaidEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    PayoutUpdated(PayoutEvent),
    Notification(Notification),
}
