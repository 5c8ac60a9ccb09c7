use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Money, Order, OrderItem, OrderStatusHistory, OrderStatusType, Product, ShippingAddress},
    order_objects::OrderQueryFilter,
};

/// Inserts a new `Pending` order header. Items and history are added separately, so callers should wrap this in a
/// transaction.
pub async fn insert_order(
    buyer_id: i64,
    total_amount: Money,
    address: &ShippingAddress,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (buyer_id, total_amount, status, shipping_address)
            VALUES ($1, $2, 'Pending', $3)
            RETURNING *;
        "#,
    )
    .bind(buyer_id)
    .bind(total_amount)
    .bind(Json(address))
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order #{} for buyer #{buyer_id} inserted ({})", order.id, order.total_amount);
    Ok(order)
}

/// Snapshots `product` into a line item on the order, locking in its current price.
pub async fn insert_order_item(
    order_id: i64,
    product: &Product,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, product_name, product_image, vendor_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.image)
    .bind(product.vendor_id)
    .bind(quantity)
    .bind(product.price)
    .fetch_one(conn)
    .await
}

pub async fn append_history(
    order_id: i64,
    status: OrderStatusType,
    changed_by: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<OrderStatusHistory, sqlx::Error> {
    let entry = sqlx::query_as(
        "INSERT INTO order_status_history (order_id, status, changed_by) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(order_id)
    .bind(status.to_string())
    .bind(changed_by)
    .fetch_one(conn)
    .await?;
    trace!("📝️ Order #{order_id} history: {status}");
    Ok(entry)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

pub async fn fetch_vendor_items(
    order_id: i64,
    vendor_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 AND vendor_id = $2 ORDER BY id")
        .bind(order_id)
        .bind(vendor_id)
        .fetch_all(conn)
        .await
}

/// Status history, oldest first. Entries written within the same second are ordered by insertion.
pub async fn fetch_history(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderStatusHistory>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY created_at, id")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_pending_order_for_payment(
    buyer_id: i64,
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE buyer_id = $1 AND gateway_order_id = $2 AND status = 'Pending'")
        .bind(buyer_id)
        .bind(gateway_order_id)
        .fetch_optional(conn)
        .await
}

pub async fn set_gateway_order_id(
    order_id: i64,
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE orders SET gateway_order_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = 'Pending' \
         RETURNING *",
    )
    .bind(gateway_order_id)
    .bind(order_id)
    .fetch_optional(conn)
    .await
}

/// Takes the writer lock for a `Pending` order and returns it. `None` if the order does not exist or is no longer
/// pending.
pub async fn lock_pending_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE orders SET updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = 'Pending' RETURNING *",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await
}

/// Removes an order together with its items and history.
pub async fn delete_order(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    sqlx::query("DELETE FROM order_status_history WHERE order_id = $1").bind(order_id).execute(&mut *conn).await?;
    sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id).execute(&mut *conn).await?;
    let rows = sqlx::query("DELETE FROM orders WHERE id = $1").bind(order_id).execute(conn).await?.rows_affected();
    debug!("📝️ Order #{order_id} deleted");
    Ok(rows == 1)
}

/// Moves the order from `from` to `to`, but only if it is still in `from`. Returns `None` if another writer got there
/// first (or the order does not exist).
pub async fn update_status(
    order_id: i64,
    from: OrderStatusType,
    to: OrderStatusType,
    tracking_number: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE orders SET
            status = $1,
            tracking_number = COALESCE($2, tracking_number),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $3 AND status = $4
        RETURNING *
        "#,
    )
    .bind(to.to_string())
    .bind(tracking_number)
    .bind(order_id)
    .bind(from.to_string())
    .fetch_optional(conn)
    .await
}

/// `Pending` → `Paid`, storing the gateway's payment id and signature. `None` if the order is no longer pending.
pub async fn record_payment(
    order_id: i64,
    payment_id: &str,
    signature: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE orders SET
            status = 'Paid',
            gateway_payment_id = $1,
            gateway_signature = $2,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $3 AND status = 'Pending'
        RETURNING *
        "#,
    )
    .bind(payment_id)
    .bind(signature)
    .bind(order_id)
    .fetch_optional(conn)
    .await
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`, newest first.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(vendor_id) = query.vendor_id {
        where_clause.push("EXISTS (SELECT 1 FROM order_items WHERE order_items.order_id = orders.id AND vendor_id = ");
        where_clause.push_bind_unseparated(vendor_id);
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        let mut first = true;
        for status in statuses {
            if !first {
                where_clause.push_unseparated(", ");
            }
            first = false;
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {} orders", orders.len());
    Ok(orders)
}
