//! Read-only order queries for buyers, vendors and admins.

use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{Order, Principal, Role},
    order_objects::OrderQueryFilter,
    traits::{AccountApiError, AccountManagement, OrderDetail, VendorOrder},
};

/// The `AccountApi` answers "what orders can I see" for every role.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The calling buyer's orders, newest first.
    pub async fn buyer_orders(&self, principal: &Principal) -> Result<Vec<Order>, AccountApiError> {
        principal.require_role(Role::Buyer).map_err(AccountApiError::PermissionDenied)?;
        self.db.fetch_orders_for_buyer(principal.id).await
    }

    /// Orders containing the calling vendor's products, with only that vendor's items.
    pub async fn vendor_orders(&self, principal: &Principal) -> Result<Vec<VendorOrder>, AccountApiError> {
        principal.require_role(Role::Vendor).map_err(AccountApiError::PermissionDenied)?;
        self.db.fetch_orders_for_vendor(principal.id).await
    }

    pub async fn all_orders(
        &self,
        principal: &Principal,
        query: OrderQueryFilter,
    ) -> Result<Vec<Order>, AccountApiError> {
        principal.require_role(Role::Admin).map_err(AccountApiError::PermissionDenied)?;
        trace!("🗃️ {principal} searching orders: {query}");
        self.db.search_orders(query).await
    }

    /// One order with its items and status history.
    ///
    /// Buyers may only see their own orders. Vendors may see orders they sold into, but only their own items. Admins
    /// see everything.
    pub async fn order_detail(&self, principal: &Principal, order_id: i64) -> Result<OrderDetail, AccountApiError> {
        let mut detail =
            self.db.fetch_order_detail(order_id).await?.ok_or(AccountApiError::OrderNotFound(order_id))?;
        let denied = || AccountApiError::PermissionDenied(format!("{principal} may not view order #{order_id}"));
        match principal.role {
            Role::Admin => {},
            Role::Buyer if detail.order.buyer_id == principal.id => {},
            Role::Vendor if detail.items.iter().any(|i| i.vendor_id == principal.id) => {
                detail.items.retain(|i| i.vendor_id == principal.id);
            },
            _ => return Err(denied()),
        }
        Ok(detail)
    }
}
