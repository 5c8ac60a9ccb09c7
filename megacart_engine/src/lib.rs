//! MegaCart Engine
//!
//! The MegaCart engine is the settlement core of a multi-vendor marketplace. It turns a buyer's cart into a paid order,
//! splits the proceeds between the platform and every vendor in the order, and lets vendors withdraw what they have
//! earned. It is transport-agnostic: the HTTP surface lives in `megacart_server`.
//!
//! The library is divided into these main sections:
//! 1. Storage ([`mod@traits`] and, with the `sqlite` feature, [`SqliteDatabase`]). The public APIs are generic over
//!    the traits, so a backend only has to implement them. The data types used in storage are defined in
//!    [`mod@db_types`] and are public.
//! 2. The public API ([`mod@mce_api`]): checkout, settlement, fulfilment, payouts, account queries and carts. Every
//!    call takes the caller's [`db_types::Principal`] explicitly.
//! 3. Collaborators: the [`mod@gateway`] adapter for the payment provider and the [`mod@notifier`] for outbound
//!    messages.
//!
//! The engine also emits events when orders are paid or shipped and when payouts change. Hooks subscribe to these via
//! [`events::EventHooks`] and run on their own tasks, so a slow or failing hook never affects the request that caused
//! the event. Notifications are delivered this way.
pub mod db_types;
pub mod events;
pub mod gateway;
pub mod helpers;
pub mod mce_api;
pub mod notifier;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use mce_api::{
    accounts_api::AccountApi,
    cart_api::{CartApi, CartContents},
    checkout_api::CheckoutApi,
    fulfilment_api::FulfilmentApi,
    order_objects,
    payout_api::PayoutApi,
    settlement_api::SettlementApi,
    MarketConfig,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccountApiError,
    AccountManagement,
    CartError,
    CartManagement,
    CatalogError,
    CatalogManagement,
    CheckoutError,
    CheckoutManagement,
    MAX_CART_LINE_QUANTITY,
    MarketDatabase,
    OrderFlowError,
    OrderManagement,
    PayoutError,
    PayoutManagement,
    SettlementError,
    SettlementManagement,
};
