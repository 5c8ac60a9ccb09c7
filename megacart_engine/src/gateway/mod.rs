//! The payment gateway adapter.
//!
//! The engine only ever talks to a gateway through the [`PaymentGateway`] trait: create a remote order for an amount,
//! and later verify the signature the gateway attached to the payment callback. [`RazorpayGateway`] is the HTTP
//! implementation used in production.
mod razorpay;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use razorpay::{sign_payment, RazorpayConfig, RazorpayGateway};

use crate::db_types::Money;

/// The gateway's handle for an order the buyer is about to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOrder {
    pub gateway_order_id: String,
    pub amount: Money,
    pub currency: String,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment signature is invalid")]
    SignatureInvalid,
    #[error("The payment gateway did not respond in time")]
    Timeout,
    #[error("The payment gateway rejected the request ({status}): {message}")]
    Remote { status: u16, message: String },
    #[error("Could not reach the payment gateway: {0}")]
    Transport(String),
    #[error("The payment gateway sent an unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Payment gateway misconfiguration: {0}")]
    Configuration(String),
}

#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Creates an order with the gateway for `amount` (in minor units) and returns the gateway's order id.
    async fn create_remote_order(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<RemoteOrder, GatewayError>;

    /// Checks the signature the gateway produced over `(gateway_order_id, gateway_payment_id)`. Returns
    /// `SignatureInvalid` if it does not match; any other error means the check could not be carried out.
    async fn verify_signature(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<(), GatewayError>;
}
