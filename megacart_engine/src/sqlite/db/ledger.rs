use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{LedgerCredit, VendorSplit};

pub async fn insert_credit(
    order_id: i64,
    split: &VendorSplit,
    conn: &mut SqliteConnection,
) -> Result<LedgerCredit, sqlx::Error> {
    let credit: LedgerCredit = sqlx::query_as(
        r#"
            INSERT INTO ledger_credits (order_id, vendor_id, subtotal, platform_fee, vendor_earnings)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(split.vendor_id)
    .bind(split.subtotal)
    .bind(split.platform_fee)
    .bind(split.vendor_earnings)
    .fetch_one(conn)
    .await?;
    trace!("💸️ Ledger credit #{} queued: {} to vendor #{}", credit.id, credit.vendor_earnings, credit.vendor_id);
    Ok(credit)
}

pub async fn fetch_pending_credits(
    order_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerCredit>, sqlx::Error> {
    match order_id {
        Some(id) => {
            sqlx::query_as("SELECT * FROM ledger_credits WHERE status = 'Pending' AND order_id = $1 ORDER BY id")
                .bind(id)
                .fetch_all(conn)
                .await
        },
        None => sqlx::query_as("SELECT * FROM ledger_credits WHERE status = 'Pending' ORDER BY id").fetch_all(conn).await,
    }
}

pub async fn fetch_credits_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerCredit>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ledger_credits WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

/// Flips a credit from `Pending` to `Applied`. Returns `None` if it was not pending, which means it must not be applied
/// again.
pub async fn mark_applied(credit_id: i64, conn: &mut SqliteConnection) -> Result<Option<LedgerCredit>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE ledger_credits SET status = 'Applied', applied_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = \
         'Pending' RETURNING *",
    )
    .bind(credit_id)
    .fetch_optional(conn)
    .await
}
