use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Money, NewUser, NewVendor, PaymentDetails, User, Vendor};

const VENDOR_SELECT: &str = "SELECT vendors.*, users.email FROM vendors JOIN users ON users.id = vendors.user_id";

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    let user: User = sqlx::query_as("INSERT INTO users (email, name, role) VALUES ($1, $2, $3) RETURNING *")
        .bind(user.email)
        .bind(user.name)
        .bind(user.role.to_string())
        .fetch_one(conn)
        .await?;
    trace!("🗃️ User #{} ({}) created", user.id, user.role);
    Ok(user)
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await
}

/// Creates a vendor profile with a zero ledger. Returns `None` if the user does not exist.
pub async fn insert_vendor(vendor: NewVendor, conn: &mut SqliteConnection) -> Result<Option<Vendor>, sqlx::Error> {
    let NewVendor { user_id, shop_name } = vendor;
    sqlx::query("INSERT INTO vendors (user_id, shop_name) VALUES ($1, $2)")
        .bind(user_id)
        .bind(shop_name)
        .execute(&mut *conn)
        .await?;
    fetch_vendor(user_id, conn).await
}

pub async fn fetch_vendor(vendor_id: i64, conn: &mut SqliteConnection) -> Result<Option<Vendor>, sqlx::Error> {
    sqlx::query_as(&format!("{VENDOR_SELECT} WHERE vendors.user_id = $1"))
        .bind(vendor_id)
        .fetch_optional(conn)
        .await
}

/// Takes the database writer lock on behalf of the vendor's ledger, then returns the vendor row as it is under the lock.
pub async fn lock_vendor(vendor_id: i64, conn: &mut SqliteConnection) -> Result<Option<Vendor>, sqlx::Error> {
    let touched = sqlx::query("UPDATE vendors SET updated_at = CURRENT_TIMESTAMP WHERE user_id = $1")
        .bind(vendor_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if touched == 0 {
        return Ok(None);
    }
    fetch_vendor(vendor_id, conn).await
}

/// Adds a settled vendor split to the ledger with in-place increments. Returns `false` if the vendor does not exist.
pub async fn credit_vendor(
    vendor_id: i64,
    subtotal: Money,
    earnings: Money,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        UPDATE vendors SET
            total_sales = total_sales + $1,
            lifetime_net_earnings = lifetime_net_earnings + $2,
            available_for_payout = available_for_payout + $2,
            updated_at = CURRENT_TIMESTAMP
        WHERE user_id = $3
        "#,
    )
    .bind(subtotal)
    .bind(earnings)
    .bind(vendor_id)
    .execute(conn)
    .await?
    .rows_affected();
    trace!("🗃️ Vendor #{vendor_id} credited with {earnings} (sales {subtotal})");
    Ok(rows == 1)
}

/// Moves `delta` into (positive) or out of (negative) the available balance. The CHECK constraint on the table stops
/// the balance going below zero.
pub async fn adjust_available_balance(
    vendor_id: i64,
    delta: Money,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let rows = sqlx::query(
        "UPDATE vendors SET available_for_payout = available_for_payout + $1, updated_at = CURRENT_TIMESTAMP WHERE \
         user_id = $2",
    )
    .bind(delta)
    .bind(vendor_id)
    .execute(conn)
    .await?
    .rows_affected();
    Ok(rows == 1)
}

pub async fn update_payment_details(
    vendor_id: i64,
    details: PaymentDetails,
    conn: &mut SqliteConnection,
) -> Result<Option<Vendor>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        UPDATE vendors SET
            bank_account_holder = $1,
            bank_account_number = $2,
            bank_ifsc = $3,
            upi_id = $4,
            updated_at = CURRENT_TIMESTAMP
        WHERE user_id = $5
        "#,
    )
    .bind(details.bank_account_holder)
    .bind(details.bank_account_number)
    .bind(details.bank_ifsc)
    .bind(details.upi_id)
    .bind(vendor_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    if rows == 0 {
        return Ok(None);
    }
    fetch_vendor(vendor_id, conn).await
}
