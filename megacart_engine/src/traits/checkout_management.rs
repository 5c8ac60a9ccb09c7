use thiserror::Error;

use crate::{
    db_types::{Money, Order, OrderItem, OrderLine, ShippingAddress},
    traits::CatalogError,
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Invalid checkout request: {0}")]
    InvalidCheckout(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Product {product_id} has {available} units in stock, but {requested} were requested")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("The payment gateway could not create an order: {0}")]
    GatewayError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutError::DatabaseError(e.to_string())
    }
}

impl From<CatalogError> for CheckoutError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(id) => CheckoutError::ProductNotFound(id),
            CatalogError::InsufficientStock { product_id, requested, available } => {
                CheckoutError::InsufficientStock { product_id, requested, available }
            },
            CatalogError::InvalidQuantity(q) => CheckoutError::InvalidCheckout(format!("invalid quantity {q}")),
            other => CheckoutError::DatabaseError(other.to_string()),
        }
    }
}

/// Storage for the first half of checkout: the provisional order.
#[allow(async_fn_in_trait)]
pub trait CheckoutManagement {
    /// In a single transaction:
    /// * creates the order in `Pending`,
    /// * reserves stock and snapshots each product into an order item,
    /// * appends the initial `Pending` history entry,
    /// * checks that the item total equals `declared_total`.
    ///
    /// If any step fails, nothing is written and no stock is reserved.
    async fn create_pending_order(
        &self,
        buyer_id: i64,
        lines: &[OrderLine],
        address: &ShippingAddress,
        declared_total: Money,
    ) -> Result<(Order, Vec<OrderItem>), CheckoutError>;

    /// Stores the payment gateway's order id against a `Pending` order.
    async fn attach_gateway_order(&self, order_id: i64, gateway_order_id: &str) -> Result<Order, CheckoutError>;

    /// Compensating step for a failed gateway call. Deletes the `Pending` order, its items and its history, and puts
    /// the reserved stock back, all in one transaction.
    async fn discard_pending_order(&self, order_id: i64) -> Result<(), CheckoutError>;
}
