use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use mc_common::Money;
use serde::{Deserialize, Serialize};
pub use sqlx::types::Json;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Type conversion error: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum Role {
    Buyer,
    Vendor,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Buyer => write!(f, "Buyer"),
            Role::Vendor => write!(f, "Vendor"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "vendor" => Ok(Self::Vendor),
            "admin" => Ok(Self::Admin),
            _ => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------       Principal       ---------------------------------------------------------
/// The authenticated caller of an engine operation. Identity is established outside the engine and passed in
/// explicitly on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub role: Role,
}

impl Principal {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn buyer(id: i64) -> Self {
        Self::new(id, Role::Buyer)
    }

    pub fn vendor(id: i64) -> Self {
        Self::new(id, Role::Vendor)
    }

    pub fn admin(id: i64) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// `Err` carries a message suitable for a `PermissionDenied` error.
    pub fn require_role(&self, role: Role) -> Result<(), String> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(format!("{self} is not allowed to perform this action. {role} role required"))
        }
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.role, self.id)
    }
}

//--------------------------------------   ShippingAddress     ---------------------------------------------------------
/// Snapshot of where an order ships to. Stored as JSON on the order and never modified after checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// All mandatory fields are present and non-blank.
    pub fn is_complete(&self) -> bool {
        [&self.full_name, &self.line1, &self.city, &self.state, &self.postal_code, &self.country]
            .iter()
            .all(|s| !s.trim().is_empty())
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// Created at checkout, stock reserved, waiting for the gateway payment.
    Pending,
    /// Payment verified and proceeds split between the platform and vendors.
    Paid,
    /// Payment verification failed. Terminal.
    Failed,
    /// A vendor has dispatched the order with a tracking number.
    Shipped,
    /// Terminal.
    Delivered,
}

impl OrderStatusType {
    /// Whether the order state machine has an edge from `self` to `next`. Same-state updates are never valid.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!((self, next), (Pending, Paid) | (Pending, Failed) | (Paid, Shipped) | (Shipped, Delivered))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Failed | OrderStatusType::Delivered)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Failed => write!(f, "Failed"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Failed" => Ok(Self::Failed),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    pub total_amount: Money,
    pub status: OrderStatusType,
    pub shipping_address: Json<ShippingAddress>,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    #[serde(skip_serializing)]
    pub gateway_signature: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One requested line of a checkout: which product and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i64,
}

impl OrderLine {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

/// A line item in an order. Name, image, vendor and unit price are copied from the product when the order is placed,
/// so later catalog edits never change what was sold.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_image: Option<String>,
    pub vendor_id: i64,
    pub quantity: i64,
    pub price: Money,
}

impl OrderItem {
    /// `price * quantity`. Checkout only stores items whose order total fits in a [`Money`], so for stored items this
    /// never saturates.
    pub fn line_total(&self) -> Money {
        self.price.saturating_mul(self.quantity)
    }

    pub fn checked_line_total(&self) -> Option<Money> {
        self.price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderStatusHistory {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatusType,
    /// The user id of the principal that caused the transition.
    pub changed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     Users & vendors   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl NewUser {
    pub fn new<S: Into<String>>(email: S, name: S, role: Role) -> Self {
        Self { email: email.into(), name: name.into(), role }
    }
}

/// Bank or UPI details a vendor must have on file before requesting a payout.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub bank_account_holder: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_ifsc: Option<String>,
    pub upi_id: Option<String>,
}

impl PaymentDetails {
    fn present(v: &Option<String>) -> bool {
        v.as_ref().map(|s| !s.trim().is_empty()).unwrap_or(false)
    }

    pub fn has_bank_account(&self) -> bool {
        Self::present(&self.bank_account_holder)
            && Self::present(&self.bank_account_number)
            && Self::present(&self.bank_ifsc)
    }

    pub fn has_upi(&self) -> bool {
        Self::present(&self.upi_id)
    }

    pub fn is_payable(&self) -> bool {
        self.has_bank_account() || self.has_upi()
    }
}

/// A vendor profile together with its ledger balances.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Vendor {
    pub user_id: i64,
    pub shop_name: String,
    pub email: String,
    /// Gross value of everything sold. Never decreases.
    pub total_sales: Money,
    /// Sales net of platform commission. Never decreases.
    pub lifetime_net_earnings: Money,
    /// Balance that can be withdrawn. Never negative.
    pub available_for_payout: Money,
    #[sqlx(flatten)]
    pub payment_details: PaymentDetails,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVendor {
    pub user_id: i64,
    pub shop_name: String,
}

impl NewVendor {
    pub fn new<S: Into<String>>(user_id: i64, shop_name: S) -> Self {
        Self { user_id, shop_name: shop_name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBalance {
    pub vendor_id: i64,
    pub total_sales: Money,
    pub lifetime_net_earnings: Money,
    pub available_for_payout: Money,
}

impl From<&Vendor> for VendorBalance {
    fn from(v: &Vendor) -> Self {
        Self {
            vendor_id: v.user_id,
            total_sales: v.total_sales,
            lifetime_net_earnings: v.lifetime_net_earnings,
            available_for_payout: v.available_for_payout,
        }
    }
}

//--------------------------------------        Products       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub vendor_id: i64,
    pub name: String,
    pub image: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub vendor_id: i64,
    pub name: String,
    pub image: Option<String>,
    pub price: Money,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(vendor_id: i64, name: S, price: Money, stock: i64) -> Self {
        Self { vendor_id, name: name.into(), image: None, price, stock }
    }

    pub fn with_image<S: Into<String>>(mut self, image: S) -> Self {
        self.image = Some(image.into());
        self
    }
}

//--------------------------------------   Ledger credits      ---------------------------------------------------------
/// One vendor's share of a paid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSplit {
    pub vendor_id: i64,
    pub subtotal: Money,
    pub platform_fee: Money,
    pub vendor_earnings: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum LedgerCreditStatus {
    Pending,
    Applied,
}

impl Display for LedgerCreditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerCreditStatus::Pending => write!(f, "Pending"),
            LedgerCreditStatus::Applied => write!(f, "Applied"),
        }
    }
}

/// A durable record of a vendor ledger credit owed for a paid order. Written in the same transaction that marks the
/// order paid and flipped to `Applied` in the same transaction that credits the vendor.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LedgerCredit {
    pub id: i64,
    pub order_id: i64,
    pub vendor_id: i64,
    pub subtotal: Money,
    pub platform_fee: Money,
    pub vendor_earnings: Money,
    pub status: LedgerCreditStatus,
    pub created_at: DateTime<Utc>,
    pub applied_at: Option<DateTime<Utc>>,
}

//--------------------------------------        Payouts        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum PayoutStatus {
    Pending,
    Completed,
    Rejected,
    Failed,
}

impl Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutStatus::Pending => write!(f, "Pending"),
            PayoutStatus::Completed => write!(f, "Completed"),
            PayoutStatus::Rejected => write!(f, "Rejected"),
            PayoutStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PayoutStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "failed" => Ok(Self::Failed),
            _ => Err(ConversionError(format!("Invalid payout status: {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payout {
    pub id: i64,
    pub vendor_id: i64,
    pub amount: Money,
    pub status: PayoutStatus,
    pub transaction_ref: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

//--------------------------------------         Carts         ---------------------------------------------------------
/// Who a cart belongs to: a signed-in buyer or an anonymous guest token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CartOwner {
    Buyer(i64),
    Guest(String),
}

impl Display for CartOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartOwner::Buyer(id) => write!(f, "buyer #{id}"),
            CartOwner::Guest(token) => write!(f, "guest {token}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub buyer_id: Option<i64>,
    pub guest_token: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}
