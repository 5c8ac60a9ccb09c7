//! A fully wired marketplace on a throwaway SQLite database, shared by the integration tests.
#![allow(dead_code)]

use log::*;
use megacart_engine::{
    db_types::{Money, OrderLine, Principal},
    events::EventProducers,
    order_objects::{CheckoutResult, NewOrderRequest, PaymentConfirmation, SettlementResult},
    test_utils::{prepare_test_env, random_db_path, test_address, MockGateway},
    AccountApi,
    CartApi,
    CheckoutApi,
    CheckoutError,
    FulfilmentApi,
    MarketConfig,
    PayoutApi,
    SettlementApi,
    SettlementError,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const OPERATOR_EMAIL: &str = "ops@megacart.test";

pub struct Market {
    pub url: String,
    pub db: SqliteDatabase,
    pub gateway: MockGateway,
    pub checkout: CheckoutApi<SqliteDatabase, MockGateway>,
    pub settlement: SettlementApi<SqliteDatabase, MockGateway>,
    pub fulfilment: FulfilmentApi<SqliteDatabase>,
    pub payouts: PayoutApi<SqliteDatabase>,
    pub accounts: AccountApi<SqliteDatabase>,
    pub carts: CartApi<SqliteDatabase>,
}

impl Market {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let gateway = MockGateway::new();
        let config = MarketConfig { operator_email: OPERATOR_EMAIL.to_string(), ..Default::default() };
        Self {
            checkout: CheckoutApi::new(db.clone(), gateway.clone(), config.clone()),
            settlement: SettlementApi::new(db.clone(), gateway.clone(), config, producers.clone()),
            fulfilment: FulfilmentApi::new(db.clone(), producers.clone()),
            payouts: PayoutApi::new(db.clone(), producers),
            accounts: AccountApi::new(db.clone()),
            carts: CartApi::new(db.clone()),
            url,
            db,
            gateway,
        }
    }

    pub async fn place_order(
        &self,
        buyer: &Principal,
        items: Vec<OrderLine>,
        total: i64,
    ) -> Result<CheckoutResult, CheckoutError> {
        let request = NewOrderRequest { items, shipping_address: test_address(), total_amount: Money::from(total) };
        self.checkout.create_order(buyer, request).await
    }

    pub async fn pay(
        &self,
        buyer: &Principal,
        checkout: &CheckoutResult,
        payment_id: &str,
    ) -> Result<SettlementResult, SettlementError> {
        let confirmation = PaymentConfirmation {
            gateway_order_id: checkout.gateway_order_id.clone(),
            gateway_payment_id: payment_id.to_string(),
            gateway_signature: MockGateway::sign(&checkout.gateway_order_id, payment_id),
        };
        self.settlement.verify_and_settle(buyer, confirmation).await
    }

    pub async fn tear_down(self) {
        let Market { mut db, url, .. } = self;
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&url).await {
            warn!("🚀️ Could not remove test database {url}: {e}");
        }
    }
}
