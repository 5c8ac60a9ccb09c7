use std::time::Duration;

use hmac::{Hmac, Mac};
use log::*;
use mc_common::Secret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::{GatewayError, PaymentGateway, RemoteOrder};
use crate::db_types::Money;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_RAZORPAY_URL: &str = "https://api.razorpay.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl RazorpayConfig {
    pub fn new<S: Into<String>>(key_id: S, key_secret: S) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: Secret::new(key_secret.into()),
            base_url: DEFAULT_RAZORPAY_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

/// Pulls the human readable description out of a gateway error body, e.g.
/// `{"error": {"code": "BAD_REQUEST_ERROR", "description": "..."}}`. Anything else is returned as is.
fn gateway_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["description"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

/// Computes the hex-encoded HMAC-SHA256 signature over `"{order_id}|{payment_id}"`, as the gateway does.
pub fn sign_payment(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> Result<String, GatewayError> {
    let mac = payment_mac(secret, gateway_order_id, gateway_payment_id)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn payment_mac(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> Result<HmacSha256, GatewayError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| GatewayError::Configuration(e.to_string()))?;
    mac.update(format!("{gateway_order_id}|{gateway_payment_id}").as_bytes());
    Ok(mac)
}

#[derive(Debug, Clone)]
pub struct RazorpayGateway {
    config: RazorpayConfig,
    client: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, GatewayError> {
        if config.key_id.is_empty() || config.key_secret.reveal().is_empty() {
            return Err(GatewayError::Configuration("Razorpay key id and secret must both be set".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn map_reqwest_error(e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

impl PaymentGateway for RazorpayGateway {
    async fn create_remote_order(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<RemoteOrder, GatewayError> {
        let url = format!("{}/v1/orders", self.config.base_url.trim_end_matches('/'));
        let body = CreateOrderRequest { amount: amount.value(), currency, receipt };
        debug!("💳️ Creating gateway order for {receipt} ({amount} {currency})");
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()))
            .json(&body)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let message = gateway_error_message(&response.text().await.unwrap_or_default());
            warn!("💳️ Gateway refused order for {receipt}: {status} {message}");
            return Err(GatewayError::Remote { status: status.as_u16(), message });
        }
        let order = response
            .json::<CreateOrderResponse>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        info!("💳️ Gateway order {} created for {receipt}", order.id);
        Ok(RemoteOrder { gateway_order_id: order.id, amount: Money::from(order.amount), currency: order.currency })
    }

    async fn verify_signature(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<(), GatewayError> {
        let expected = hex::decode(signature.trim()).map_err(|_| GatewayError::SignatureInvalid)?;
        let mac = payment_mac(self.config.key_secret.reveal(), gateway_order_id, gateway_payment_id)?;
        mac.verify_slice(&expected).map_err(|_| {
            debug!("💳️ Signature check failed for payment {gateway_payment_id} on {gateway_order_id}");
            GatewayError::SignatureInvalid
        })
    }
}
