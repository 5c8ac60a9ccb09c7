use thiserror::Error;

use crate::db_types::{Cart, CartItem, CartOwner};

/// The most units of one product a single cart line may hold.
pub const MAX_CART_LINE_QUANTITY: i64 = 10_000;

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Quantity must be between 1 and {MAX_CART_LINE_QUANTITY}, but was {0}")]
    InvalidQuantity(i64),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Returns the owner's active cart, creating an empty one on first access.
    async fn fetch_or_create_cart(&self, owner: &CartOwner) -> Result<Cart, CartError>;

    async fn fetch_cart_items(&self, cart_id: i64) -> Result<Vec<CartItem>, CartError>;

    /// Adds `quantity` units of a product. If the product is already in the cart, the quantities are summed. Fails with
    /// `InvalidQuantity` if the line would end up above [`MAX_CART_LINE_QUANTITY`].
    async fn add_cart_item(&self, owner: &CartOwner, product_id: i64, quantity: i64) -> Result<CartItem, CartError>;

    /// Sets the quantity of a product in the cart. A quantity of zero or less removes the item and returns `None`.
    async fn set_cart_item_quantity(
        &self,
        owner: &CartOwner,
        product_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartError>;

    /// Returns `true` if an item was removed.
    async fn remove_cart_item(&self, owner: &CartOwner, product_id: i64) -> Result<bool, CartError>;

    /// Folds the guest's active cart into the buyer's, summing quantities for products present in both, and
    /// deactivates the guest cart. Runs in one transaction and returns the buyer's cart. If a summed line would exceed
    /// [`MAX_CART_LINE_QUANTITY`], nothing changes and both carts are left as they were.
    async fn merge_guest_cart(&self, guest_token: &str, buyer_id: i64) -> Result<Cart, CartError>;

    /// Empties the buyer's active cart. Returns the number of items removed.
    async fn clear_active_cart(&self, buyer_id: i64) -> Result<u64, CartError>;
}
