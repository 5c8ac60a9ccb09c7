use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use crate::{
    db_types::Money,
    gateway::{sign_payment, GatewayError, PaymentGateway, RemoteOrder},
};

/// The secret the mock gateway signs payments with.
pub const MOCK_GATEWAY_SECRET: &str = "mock_gateway_secret";

/// An in-process stand-in for the payment provider. Order ids are sequential and signatures are real HMACs over
/// [`MOCK_GATEWAY_SECRET`], so tests can produce valid and tampered confirmations. Clones share their switches.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    next_id: Arc<AtomicU64>,
    refuse_orders: Arc<AtomicBool>,
    unreachable: Arc<AtomicBool>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, `create_remote_order` fails as if the provider returned an error.
    pub fn refuse_orders(&self, refuse: bool) {
        self.refuse_orders.store(refuse, Ordering::SeqCst);
    }

    /// While set, every call fails with a transport error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// The signature the provider would hand the buyer for this payment.
    pub fn sign(gateway_order_id: &str, gateway_payment_id: &str) -> String {
        sign_payment(MOCK_GATEWAY_SECRET, gateway_order_id, gateway_payment_id).expect("HMAC accepts any key length")
    }

    fn check_reachable(&self) -> Result<(), GatewayError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("connection refused".into()));
        }
        Ok(())
    }
}

impl PaymentGateway for MockGateway {
    async fn create_remote_order(
        &self,
        amount: Money,
        currency: &str,
        _receipt: &str,
    ) -> Result<RemoteOrder, GatewayError> {
        self.check_reachable()?;
        if self.refuse_orders.load(Ordering::SeqCst) {
            return Err(GatewayError::Remote { status: 400, message: "order creation refused".into() });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RemoteOrder { gateway_order_id: format!("order_mock{id:06}"), amount, currency: currency.to_string() })
    }

    async fn verify_signature(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<(), GatewayError> {
        self.check_reachable()?;
        if Self::sign(gateway_order_id, gateway_payment_id) == signature {
            Ok(())
        } else {
            Err(GatewayError::SignatureInvalid)
        }
    }
}
