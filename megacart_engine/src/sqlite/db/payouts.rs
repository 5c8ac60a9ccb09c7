use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Money, Payout, PayoutStatus};

pub async fn insert_payout(vendor_id: i64, amount: Money, conn: &mut SqliteConnection) -> Result<Payout, sqlx::Error> {
    let payout: Payout =
        sqlx::query_as("INSERT INTO payouts (vendor_id, amount, status) VALUES ($1, $2, 'Pending') RETURNING *")
            .bind(vendor_id)
            .bind(amount)
            .fetch_one(conn)
            .await?;
    trace!("🏦️ Payout #{} of {amount} requested by vendor #{vendor_id}", payout.id);
    Ok(payout)
}

pub async fn fetch_payout(payout_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payout>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payouts WHERE id = $1").bind(payout_id).fetch_optional(conn).await
}

pub async fn fetch_pending_payout(vendor_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payout>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payouts WHERE vendor_id = $1 AND status = 'Pending'")
        .bind(vendor_id)
        .fetch_optional(conn)
        .await
}

/// Resolves a payout, but only while it is still `Pending`. Sets `paid_at` when the decision is `Completed`.
pub async fn resolve_payout(
    payout_id: i64,
    decision: PayoutStatus,
    transaction_ref: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payout>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE payouts SET
            status = $1,
            transaction_ref = COALESCE($2, transaction_ref),
            paid_at = CASE WHEN $1 = 'Completed' THEN CURRENT_TIMESTAMP ELSE NULL END,
            resolved_at = CURRENT_TIMESTAMP
        WHERE id = $3 AND status = 'Pending'
        RETURNING *
        "#,
    )
    .bind(decision.to_string())
    .bind(transaction_ref)
    .bind(payout_id)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_payouts_for_vendor(
    vendor_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payout>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payouts WHERE vendor_id = $1 ORDER BY requested_at DESC, id DESC")
        .bind(vendor_id)
        .fetch_all(conn)
        .await
}

pub async fn search_payouts(
    status: Option<PayoutStatus>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payout>, sqlx::Error> {
    match status {
        Some(s) => {
            sqlx::query_as("SELECT * FROM payouts WHERE status = $1 ORDER BY requested_at DESC, id DESC")
                .bind(s.to_string())
                .fetch_all(conn)
                .await
        },
        None => sqlx::query_as("SELECT * FROM payouts ORDER BY requested_at DESC, id DESC").fetch_all(conn).await,
    }
}
