//! # MegaCart engine public API
//!
//! The `mce_api` module exposes the programmatic API of the MegaCart engine. Each API is a thin struct over a storage
//! backend (and, where needed, a payment gateway), so callers can pick the pieces they need.
//!
//! * [`checkout_api`] turns a buyer's cart into a `Pending` order and a gateway payment order.
//! * [`settlement_api`] verifies gateway payments, splits the proceeds and credits vendor ledgers.
//! * [`fulfilment_api`] lets vendors move paid orders through shipping and delivery.
//! * [`payout_api`] handles vendor withdrawals and their admin approval.
//! * [`accounts_api`] answers order listing and detail queries for buyers, vendors and admins.
//! * [`cart_api`] manages buyer and guest carts.
//!
//! Every operation takes the calling [`crate::db_types::Principal`] explicitly and checks its role before touching
//! storage.
//!
//! # API usage
//!
//! ```rust,ignore
//! use megacart_engine::{AccountApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/megacart.db", 5).await?;
//! let api = AccountApi::new(db);
//! let orders = api.buyer_orders(&Principal::buyer(1)).await?;
//! ```
use mc_common::{CommissionRate, DEFAULT_CURRENCY_CODE};

pub mod accounts_api;
pub mod cart_api;
pub mod checkout_api;
pub mod fulfilment_api;
pub mod order_objects;
pub mod payout_api;
pub mod settlement_api;

const DEFAULT_OPERATOR_EMAIL: &str = "operator@megacart.local";

/// Marketplace-wide settings shared by the checkout and settlement APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketConfig {
    /// ISO currency code sent to the payment gateway.
    pub currency: String,
    /// Platform commission taken from every vendor's sales.
    pub commission: CommissionRate,
    /// Receives a summary of every settled order.
    pub operator_email: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            commission: CommissionRate::default(),
            operator_email: DEFAULT_OPERATOR_EMAIL.to_string(),
        }
    }
}
