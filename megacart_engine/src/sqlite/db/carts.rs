use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Cart, CartItem, CartOwner};

fn owner_columns(owner: &CartOwner) -> (Option<i64>, Option<&str>) {
    match owner {
        CartOwner::Buyer(id) => (Some(*id), None),
        CartOwner::Guest(token) => (None, Some(token.as_str())),
    }
}

pub async fn fetch_active_cart(owner: &CartOwner, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    match owner {
        CartOwner::Buyer(id) => {
            sqlx::query_as("SELECT * FROM carts WHERE buyer_id = $1 AND is_active = 1")
                .bind(id)
                .fetch_optional(conn)
                .await
        },
        CartOwner::Guest(token) => {
            sqlx::query_as("SELECT * FROM carts WHERE guest_token = $1 AND is_active = 1")
                .bind(token)
                .fetch_optional(conn)
                .await
        },
    }
}

/// Returns the owner's active cart, creating it if needed. The partial unique indexes on `carts` make the insert a no-op
/// when an active cart already exists, so concurrent first accesses still end up with a single cart.
pub async fn fetch_or_create_cart(owner: &CartOwner, conn: &mut SqliteConnection) -> Result<Cart, sqlx::Error> {
    let (buyer_id, guest_token) = owner_columns(owner);
    let rows = sqlx::query("INSERT OR IGNORE INTO carts (buyer_id, guest_token, is_active) VALUES ($1, $2, 1)")
        .bind(buyer_id)
        .bind(guest_token)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if rows > 0 {
        trace!("🛒️ New cart created for {owner}");
    }
    fetch_active_cart(owner, conn).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn fetch_cart_items(cart_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY id").bind(cart_id).fetch_all(conn).await
}

/// Adds to the existing quantity, or inserts the item.
pub async fn add_item(
    cart_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity
        RETURNING *
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await
}

/// Overwrites the quantity, or inserts the item.
pub async fn set_item_quantity(
    cart_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = excluded.quantity
        RETURNING *
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await
}

pub async fn remove_item(cart_id: i64, product_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let rows = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

/// Empties the buyer's active cart, if there is one. A single statement, so it never holds a read lock while waiting
/// to write.
pub async fn clear_buyer_cart(buyer_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let rows = sqlx::query(
        "DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE buyer_id = $1 AND is_active = 1)",
    )
    .bind(buyer_id)
    .execute(conn)
    .await?
    .rows_affected();
    Ok(rows)
}

/// Soft-deletes the guest's active cart and returns it. `None` if the guest has no active cart.
pub async fn deactivate_guest_cart(guest_token: &str, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE carts SET is_active = 0, updated_at = CURRENT_TIMESTAMP WHERE guest_token = $1 AND is_active = 1 \
         RETURNING *",
    )
    .bind(guest_token)
    .fetch_optional(conn)
    .await
}

pub async fn touch_cart(cart_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE carts SET updated_at = CURRENT_TIMESTAMP WHERE id = $1").bind(cart_id).execute(conn).await?;
    Ok(())
}
