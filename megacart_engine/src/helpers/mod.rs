//! Pure functions shared by the engine APIs and the storage backend.
use std::collections::BTreeMap;

use mc_common::CommissionRate;
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    db_types::{Money, OrderItem, OrderLine, VendorSplit},
    traits::{CartError, MAX_CART_LINE_QUANTITY},
};

const GUEST_TOKEN_LENGTH: usize = 32;

/// Groups an order's items by vendor and works out the platform's commission and the vendor's earnings for each
/// group. Splits are returned in ascending vendor id order.
///
/// For every group, `platform_fee + vendor_earnings == subtotal`, so the sum over all groups equals the order total.
pub fn vendor_splits(items: &[OrderItem], rate: CommissionRate) -> Vec<VendorSplit> {
    let mut subtotals = BTreeMap::<i64, Money>::new();
    for item in items {
        let subtotal = subtotals.entry(item.vendor_id).or_default();
        *subtotal = subtotal.saturating_add(item.line_total());
    }
    subtotals
        .into_iter()
        .map(|(vendor_id, subtotal)| {
            let platform_fee = rate.fee_on(subtotal);
            VendorSplit { vendor_id, subtotal, platform_fee, vendor_earnings: subtotal - platform_fee }
        })
        .collect()
}

/// The sum of every item's line total, or `None` if it cannot be represented.
pub fn order_total(items: &[OrderItem]) -> Option<Money> {
    items.iter().try_fold(Money::default(), |total, item| total.checked_add(item.checked_line_total()?))
}

/// Merges a guest's cart lines into a buyer's. Quantities for products in both carts are summed. The result is in
/// ascending product id order and contains every product from either side exactly once.
///
/// Fails with `InvalidQuantity` if any summed line exceeds [`MAX_CART_LINE_QUANTITY`].
pub fn merge_cart_lines(buyer: &[OrderLine], guest: &[OrderLine]) -> Result<Vec<OrderLine>, CartError> {
    let mut merged = BTreeMap::<i64, i64>::new();
    for line in buyer.iter().chain(guest.iter()) {
        let quantity = merged.entry(line.product_id).or_default();
        *quantity = quantity
            .checked_add(line.quantity)
            .filter(|q| *q <= MAX_CART_LINE_QUANTITY)
            .ok_or(CartError::InvalidQuantity(quantity.saturating_add(line.quantity)))?;
    }
    Ok(merged.into_iter().map(|(product_id, quantity)| OrderLine { product_id, quantity }).collect())
}

/// The receipt reference sent to the payment gateway for an order.
pub fn receipt_for_order(order_id: i64) -> String {
    format!("order_rcpt_{order_id}")
}

/// A random, URL-safe token identifying an anonymous shopper's cart.
pub fn new_guest_token() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(GUEST_TOKEN_LENGTH).map(char::from).collect()
}
