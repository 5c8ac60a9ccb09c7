use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, OrderItem, OrderStatusHistory};

/// An order with all of its line items and its status history (oldest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<OrderStatusHistory>,
}

/// What a vendor sees of an order: the order header and only the line items they sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub vendor_subtotal: Money,
}

impl VendorOrder {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        let vendor_subtotal = items.iter().map(OrderItem::line_total).sum();
        Self { order, items, vendor_subtotal }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRetryResult {
    pub applied: usize,
    pub failed: usize,
}
