//! The inventory guard lives here. Stock only ever changes through a single conditional `UPDATE`, so two buyers
//! racing for the last unit cannot both win.
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product},
    traits::CatalogError,
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (vendor_id, name, image, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(product.vendor_id)
    .bind(product.name)
    .bind(product.image)
    .bind(product.price)
    .bind(product.stock)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Product #{} created with {} in stock", product.id, product.stock);
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await
}

/// Decrements stock by `quantity` if, and only if, enough stock is available.
pub async fn reserve_stock(
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Product, CatalogError> {
    if quantity < 1 {
        return Err(CatalogError::InvalidQuantity(quantity));
    }
    let reserved: Option<Product> =
        sqlx::query_as("UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1 RETURNING *")
            .bind(quantity)
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;
    match reserved {
        Some(product) => {
            trace!("🗃️ Reserved {quantity} of product #{product_id}. {} left", product.stock);
            Ok(product)
        },
        None => match fetch_product(product_id, conn).await? {
            Some(product) => {
                debug!("🗃️ Cannot reserve {quantity} of product #{product_id}. Only {} in stock", product.stock);
                Err(CatalogError::InsufficientStock { product_id, requested: quantity, available: product.stock })
            },
            None => Err(CatalogError::ProductNotFound(product_id)),
        },
    }
}

pub async fn release_stock(
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Product, CatalogError> {
    if quantity < 1 {
        return Err(CatalogError::InvalidQuantity(quantity));
    }
    let product: Option<Product> =
        sqlx::query_as("UPDATE products SET stock = stock + $1 WHERE id = $2 RETURNING *")
            .bind(quantity)
            .bind(product_id)
            .fetch_optional(conn)
            .await?;
    trace!("🗃️ Released {quantity} of product #{product_id}");
    product.ok_or(CatalogError::ProductNotFound(product_id))
}
