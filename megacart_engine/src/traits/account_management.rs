use thiserror::Error;

use crate::{
    db_types::Order,
    order_objects::OrderQueryFilter,
    traits::{OrderDetail, VendorOrder},
};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// Read-only queries behind the order listing screens.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// The buyer's orders, newest first.
    async fn fetch_orders_for_buyer(&self, buyer_id: i64) -> Result<Vec<Order>, AccountApiError>;

    /// Every order containing at least one item sold by the vendor, newest first. Only that vendor's items are
    /// included.
    async fn fetch_orders_for_vendor(&self, vendor_id: i64) -> Result<Vec<VendorOrder>, AccountApiError>;

    async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, AccountApiError>;

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError>;
}
