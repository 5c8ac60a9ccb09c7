use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, OrderLine, OrderStatusType, ShippingAddress, VendorSplit};

/// Criteria for the admin order listing. Empty criteria match every order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<i64>,
    pub vendor_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn with_buyer_id(mut self, buyer_id: i64) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_vendor_id(mut self, vendor_id: i64) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none()
            && self.vendor_id.is_none()
            && self.since.is_none()
            && self.until.is_none()
            && self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true)
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "All orders");
        }
        let mut parts = Vec::new();
        if let Some(id) = self.buyer_id {
            parts.push(format!("buyer #{id}"));
        }
        if let Some(id) = self.vendor_id {
            parts.push(format!("vendor #{id}"));
        }
        if let Some(since) = self.since {
            parts.push(format!("since {since}"));
        }
        if let Some(until) = self.until {
            parts.push(format!("until {until}"));
        }
        if let Some(status) = &self.status {
            let s = status.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(",");
            parts.push(format!("status in [{s}]"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// A buyer's checkout request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub items: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    /// The total the client expects to pay. Must match the sum of the locked-in item prices.
    pub total_amount: Money,
}

/// What the client needs to open the gateway's payment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order_id: i64,
    pub gateway_order_id: String,
    pub amount: Money,
    pub currency: String,
}

/// The fields the gateway hands back to the client after a successful payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
}

/// The outcome of a verified payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementResult {
    pub order: Order,
    pub splits: Vec<VendorSplit>,
    /// Vendors whose ledger credit could not be applied yet. Their credits stay queued and are retried later.
    pub deferred_vendors: Vec<i64>,
}

impl SettlementResult {
    pub fn is_fully_settled(&self) -> bool {
        self.deferred_vendors.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn filter_display() {
        assert_eq!(OrderQueryFilter::default().to_string(), "All orders");
        let f = OrderQueryFilter::default()
            .with_buyer_id(4)
            .with_status(OrderStatusType::Paid)
            .with_status(OrderStatusType::Shipped);
        assert!(!f.is_empty());
        assert_eq!(f.to_string(), "buyer #4, status in [Paid,Shipped]");
    }

    #[test]
    fn empty_status_list_is_empty_filter() {
        let f = OrderQueryFilter { status: Some(vec![]), ..Default::default() };
        assert!(f.is_empty());
    }
}
