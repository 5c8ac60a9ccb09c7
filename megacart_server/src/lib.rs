//! # MegaCart server
//! This crate hosts the HTTP front end for the MegaCart settlement core. It is responsible for:
//! * Establishing who is calling, from the signed `x-principal` header set by the identity service.
//! * Translating requests into calls on the engine APIs, and engine errors into HTTP responses.
//! * Running the background ledger credit retry worker and the notification hooks.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/checkout`, `/api/payment/verify`: Checkout and payment settlement.
//! * `/api/orders`, `/api/vendor/orders`, `/api/order/{id}`, `/api/search/orders`: Order queries.
//! * `/api/order/{id}/status`: Vendor fulfilment updates.
//! * `/api/payouts`, `/api/admin/payouts`, `/api/balance`, `/api/payment_details`: Vendor payouts.
//! * `/api/cart`, `/api/guest_token`: Buyer and guest carts.

pub mod auth;
pub mod cli;
pub mod config;
pub mod credit_worker;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod hooks;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
