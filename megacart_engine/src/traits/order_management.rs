use thiserror::Error;

use crate::db_types::{Order, OrderItem, OrderStatusHistory, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("A tracking number is required to mark an order as shipped")]
    TrackingNumberRequired,
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderFlowError>;

    /// Status history, oldest first.
    async fn fetch_status_history(&self, order_id: i64) -> Result<Vec<OrderStatusHistory>, OrderFlowError>;

    /// Moves an order from `from` to `to` and appends a history entry, in one transaction. The update is conditional on
    /// the order still being in `from`. If it is not, the order's actual status is reported as an
    /// `InvalidTransition`. The tracking number, when given, is stored with the transition.
    async fn transition_order(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
        actor: i64,
        tracking_number: Option<&str>,
    ) -> Result<Order, OrderFlowError>;
}
