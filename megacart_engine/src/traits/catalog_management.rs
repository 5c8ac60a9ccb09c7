use thiserror::Error;

use crate::db_types::{NewProduct, NewUser, NewVendor, Product, User, Vendor};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Product {product_id} has {available} units in stock, but {requested} were requested")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("Quantity must be at least 1, but was {0}")]
    InvalidQuantity(i64),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Vendor {0} does not exist")]
    VendorNotFound(i64),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// Minimal persistence for the records the settlement core depends on but does not own: users, vendor profiles and
/// products. It also exposes the inventory guard.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_user(&self, user: NewUser) -> Result<User, CatalogError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, CatalogError>;

    /// Creates a vendor profile (with an empty ledger) for an existing user.
    async fn insert_vendor(&self, vendor: NewVendor) -> Result<Vendor, CatalogError>;

    async fn fetch_vendor(&self, vendor_id: i64) -> Result<Option<Vendor>, CatalogError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;

    /// Atomically removes `quantity` units from stock. Fails with `InsufficientStock` rather than letting stock go
    /// negative. Returns the product as it is after the reservation.
    async fn reserve_stock(&self, product_id: i64, quantity: i64) -> Result<Product, CatalogError>;

    /// Returns `quantity` units to stock.
    async fn release_stock(&self, product_id: i64, quantity: i64) -> Result<Product, CatalogError>;
}
