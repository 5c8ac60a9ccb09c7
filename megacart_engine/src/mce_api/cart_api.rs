use std::fmt::Debug;

use log::*;
use serde::Serialize;

use crate::{
    db_types::{Cart, CartItem, CartOwner, Principal, Role},
    helpers::new_guest_token,
    traits::{CartError, CartManagement},
};

/// A cart together with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartContents {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}

/// `CartApi` stores shopping carts for signed-in buyers and anonymous guests, and folds a guest's cart into the
/// buyer's when they sign in.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// A fresh token to identify a guest's cart.
    pub fn new_guest_token() -> String {
        new_guest_token()
    }

    /// The owner's active cart. An empty cart is created on first access.
    pub async fn cart(&self, owner: &CartOwner) -> Result<CartContents, CartError> {
        let cart = self.db.fetch_or_create_cart(owner).await?;
        let items = self.db.fetch_cart_items(cart.id).await?;
        Ok(CartContents { cart, items })
    }

    pub async fn add_item(&self, owner: &CartOwner, product_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        self.db.add_cart_item(owner, product_id, quantity).await
    }

    /// Returns `None` if the quantity was zero or less and the item was removed.
    pub async fn set_quantity(
        &self,
        owner: &CartOwner,
        product_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartError> {
        self.db.set_cart_item_quantity(owner, product_id, quantity).await
    }

    pub async fn remove_item(&self, owner: &CartOwner, product_id: i64) -> Result<bool, CartError> {
        self.db.remove_cart_item(owner, product_id).await
    }

    /// Merges the guest cart identified by `guest_token` into the calling buyer's cart and returns the result.
    pub async fn merge_guest_cart(
        &self,
        principal: &Principal,
        guest_token: &str,
    ) -> Result<CartContents, CartError> {
        principal.require_role(Role::Buyer).map_err(CartError::PermissionDenied)?;
        let cart = self.db.merge_guest_cart(guest_token, principal.id).await?;
        let items = self.db.fetch_cart_items(cart.id).await?;
        debug!("🛒️ Guest cart merged for {principal}. The cart now holds {} products", items.len());
        Ok(CartContents { cart, items })
    }
}
