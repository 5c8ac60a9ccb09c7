use thiserror::Error;

use crate::db_types::{LedgerCredit, Order, VendorSplit};

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("No pending order matches gateway order {0}")]
    OrderNotFound(String),
    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),
    #[error("Payment could not be settled: {0}")]
    ProcessingError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        SettlementError::DatabaseError(e.to_string())
    }
}

/// Storage for payment verification and the vendor ledger credit outbox.
#[allow(async_fn_in_trait)]
pub trait SettlementManagement {
    /// The buyer's `Pending` order that carries the given gateway order id, if any.
    async fn fetch_pending_order_for_payment(
        &self,
        buyer_id: i64,
        gateway_order_id: &str,
    ) -> Result<Option<Order>, SettlementError>;

    /// `Pending` → `Failed`, with a history entry. Fails with `OrderNotFound` if the order has already left `Pending`.
    async fn mark_order_failed(&self, order_id: i64, actor: i64) -> Result<Order, SettlementError>;

    /// In a single transaction: `Pending` → `Paid`, records the gateway payment id and signature, appends history and
    /// writes one pending ledger credit per vendor split. A concurrent second caller gets `OrderNotFound`.
    async fn mark_order_paid(
        &self,
        order_id: i64,
        payment_id: &str,
        signature: &str,
        actor: i64,
        splits: &[VendorSplit],
    ) -> Result<Order, SettlementError>;

    /// Ledger credits still waiting to be applied. Restricted to one order if `order_id` is given.
    async fn fetch_pending_credits(&self, order_id: Option<i64>) -> Result<Vec<LedgerCredit>, SettlementError>;

    /// Applies one credit to its vendor's ledger and marks it applied, in one transaction. Returns `false` if the credit
    /// had already been applied, so calling this twice never double-credits.
    async fn apply_ledger_credit(&self, credit_id: i64) -> Result<bool, SettlementError>;
}
