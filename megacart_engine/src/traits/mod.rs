//! # Storage backend contracts
//!
//! The traits in this module define what a storage backend must provide in order to drive the MegaCart engine. The
//! public APIs in `mce_api` are generic over these traits, so a backend (currently SQLite) only needs to implement them
//! and never leaks into callers.
//!
//! * [`CatalogManagement`] covers the minimal user, vendor and product records, plus the inventory guard.
//! * [`CheckoutManagement`] creates provisional orders and rolls them back.
//! * [`SettlementManagement`] moves orders out of `Pending` and manages the ledger credit outbox.
//! * [`OrderManagement`] reads orders and applies the fulfilment transitions.
//! * [`PayoutManagement`] handles vendor withdrawals against the ledger.
//! * [`AccountManagement`] answers the read-only queries for buyers, vendors and admins.
//! * [`CartManagement`] stores buyer and guest carts.
//!
//! [`MarketDatabase`] ties them all together.
mod account_management;
mod cart_management;
mod catalog_management;
mod checkout_management;
mod data_objects;
mod order_management;
mod payout_management;
mod settlement_management;

pub use account_management::{AccountApiError, AccountManagement};
pub use cart_management::{CartError, CartManagement, MAX_CART_LINE_QUANTITY};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use checkout_management::{CheckoutError, CheckoutManagement};
pub use data_objects::{CreditRetryResult, OrderDetail, VendorOrder};
pub use order_management::{OrderFlowError, OrderManagement};
pub use payout_management::{PayoutError, PayoutManagement};
pub use settlement_management::{SettlementError, SettlementManagement};

/// The full set of behaviour a backend must support to run the marketplace.
pub trait MarketDatabase:
    Clone
    + CatalogManagement
    + CheckoutManagement
    + SettlementManagement
    + OrderManagement
    + PayoutManagement
    + AccountManagement
    + CartManagement
{
    /// The URL of the database
    fn url(&self) -> &str;
}
