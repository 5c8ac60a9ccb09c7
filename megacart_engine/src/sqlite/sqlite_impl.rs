//! `SqliteDatabase` is a concrete implementation of a MegaCart engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module. Every multi-statement operation runs in one transaction whose first statement is a write, so concurrent
//! requests queue on SQLite's writer lock instead of acting on stale reads.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{carts, db_url, ledger, new_pool, orders, payouts, products, users};
use crate::{
    db_types::{
        Cart,
        CartItem,
        CartOwner,
        LedgerCredit,
        Money,
        NewProduct,
        NewUser,
        NewVendor,
        Order,
        OrderItem,
        OrderLine,
        OrderStatusHistory,
        OrderStatusType,
        PaymentDetails,
        Payout,
        PayoutStatus,
        Product,
        ShippingAddress,
        User,
        Vendor,
        VendorBalance,
        VendorSplit,
    },
    helpers::{merge_cart_lines, order_total},
    order_objects::OrderQueryFilter,
    traits::{
        AccountApiError,
        AccountManagement,
        CartError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        CheckoutError,
        CheckoutManagement,
        MAX_CART_LINE_QUANTITY,
        MarketDatabase,
        OrderDetail,
        OrderFlowError,
        OrderManagement,
        PayoutError,
        PayoutManagement,
        SettlementError,
        SettlementManagement,
        VendorOrder,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MarketDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::insert_user(user, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn insert_vendor(&self, vendor: NewVendor) -> Result<Vendor, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let user_id = vendor.user_id;
        let vendor = users::insert_vendor(vendor, &mut tx).await?.ok_or(CatalogError::UserNotFound(user_id))?;
        tx.commit().await?;
        debug!("🗃️ Vendor profile \"{}\" created for user #{user_id}", vendor.shop_name);
        Ok(vendor)
    }

    async fn fetch_vendor(&self, vendor_id: i64) -> Result<Option<Vendor>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let vendor = users::fetch_vendor(vendor_id, &mut conn).await?;
        Ok(vendor)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn reserve_stock(&self, product_id: i64, quantity: i64) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::reserve_stock(product_id, quantity, &mut conn).await
    }

    async fn release_stock(&self, product_id: i64, quantity: i64) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::release_stock(product_id, quantity, &mut conn).await
    }
}

impl CheckoutManagement for SqliteDatabase {
    async fn create_pending_order(
        &self,
        buyer_id: i64,
        lines: &[OrderLine],
        address: &ShippingAddress,
        declared_total: Money,
    ) -> Result<(Order, Vec<OrderItem>), CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(buyer_id, declared_total, address, &mut tx).await?;
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let product = products::reserve_stock(line.product_id, line.quantity, &mut tx).await?;
            let item = orders::insert_order_item(order.id, &product, line.quantity, &mut tx).await?;
            items.push(item);
        }
        orders::append_history(order.id, OrderStatusType::Pending, Some(buyer_id), &mut tx).await?;
        let computed = match order_total(&items) {
            Some(total) => total,
            None => {
                tx.rollback().await?;
                return Err(CheckoutError::InvalidCheckout("the item total is too large".into()));
            },
        };
        if computed != declared_total {
            debug!("🗃️ Order for buyer #{buyer_id} declared {declared_total} but items add up to {computed}. Rolling back");
            tx.rollback().await?;
            return Err(CheckoutError::InvalidCheckout(format!(
                "declared total {declared_total} does not match the item total {computed}"
            )));
        }
        tx.commit().await?;
        Ok((order, items))
    }

    async fn attach_gateway_order(&self, order_id: i64, gateway_order_id: &str) -> Result<Order, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::set_gateway_order_id(order_id, gateway_order_id, &mut conn)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;
        trace!("🗃️ Order #{order_id} linked to gateway order {gateway_order_id}");
        Ok(order)
    }

    async fn discard_pending_order(&self, order_id: i64) -> Result<(), CheckoutError> {
        let mut tx = self.pool.begin().await?;
        if orders::lock_pending_order(order_id, &mut tx).await?.is_none() {
            return Err(CheckoutError::OrderNotFound(order_id));
        }
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        for item in &items {
            products::release_stock(item.product_id, item.quantity, &mut tx).await?;
        }
        orders::delete_order(order_id, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Pending order #{order_id} discarded and {} item reservations released", items.len());
        Ok(())
    }
}

impl SettlementManagement for SqliteDatabase {
    async fn fetch_pending_order_for_payment(
        &self,
        buyer_id: i64,
        gateway_order_id: &str,
    ) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_pending_order_for_payment(buyer_id, gateway_order_id, &mut conn).await?;
        Ok(order)
    }

    async fn mark_order_failed(&self, order_id: i64, actor: i64) -> Result<Order, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_status(order_id, OrderStatusType::Pending, OrderStatusType::Failed, None, &mut tx)
            .await?
            .ok_or_else(|| SettlementError::OrderNotFound(format!("order #{order_id}")))?;
        orders::append_history(order_id, OrderStatusType::Failed, Some(actor), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} marked as failed");
        Ok(order)
    }

    async fn mark_order_paid(
        &self,
        order_id: i64,
        payment_id: &str,
        signature: &str,
        actor: i64,
        splits: &[VendorSplit],
    ) -> Result<Order, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::record_payment(order_id, payment_id, signature, &mut tx)
            .await?
            .ok_or_else(|| SettlementError::OrderNotFound(format!("order #{order_id}")))?;
        orders::append_history(order_id, OrderStatusType::Paid, Some(actor), &mut tx).await?;
        for split in splits {
            ledger::insert_credit(order_id, split, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} marked as paid with {} vendor credits queued", splits.len());
        Ok(order)
    }

    async fn fetch_pending_credits(&self, order_id: Option<i64>) -> Result<Vec<LedgerCredit>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        let credits = ledger::fetch_pending_credits(order_id, &mut conn).await?;
        Ok(credits)
    }

    async fn apply_ledger_credit(&self, credit_id: i64) -> Result<bool, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let credit = match ledger::mark_applied(credit_id, &mut tx).await? {
            Some(c) => c,
            None => {
                trace!("🗃️ Ledger credit #{credit_id} is not pending. Nothing to apply");
                return Ok(false);
            },
        };
        let credited = users::credit_vendor(credit.vendor_id, credit.subtotal, credit.vendor_earnings, &mut tx).await?;
        if !credited {
            tx.rollback().await?;
            return Err(SettlementError::ProcessingError(format!(
                "vendor #{} for ledger credit #{credit_id} does not exist",
                credit.vendor_id
            )));
        }
        tx.commit().await?;
        debug!(
            "🗃️ Ledger credit #{credit_id} applied: vendor #{} +{} (order #{})",
            credit.vendor_id, credit.vendor_earnings, credit.order_id
        );
        Ok(true)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_status_history(&self, order_id: i64) -> Result<Vec<OrderStatusHistory>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let history = orders::fetch_history(order_id, &mut conn).await?;
        Ok(history)
    }

    async fn transition_order(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
        actor: i64,
        tracking_number: Option<&str>,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let updated = orders::update_status(order_id, from, to, tracking_number, &mut tx).await?;
        let order = match updated {
            Some(o) => o,
            None => {
                let current = orders::fetch_order(order_id, &mut tx).await?;
                tx.rollback().await?;
                return match current {
                    Some(o) => Err(OrderFlowError::InvalidTransition { from: o.status, to }),
                    None => Err(OrderFlowError::OrderNotFound(order_id)),
                };
            },
        };
        orders::append_history(order_id, to, Some(actor), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} moved from {from} to {to}");
        Ok(order)
    }
}

impl PayoutManagement for SqliteDatabase {
    async fn request_payout(&self, vendor_id: i64) -> Result<Payout, PayoutError> {
        let mut tx = self.pool.begin().await?;
        let vendor = users::lock_vendor(vendor_id, &mut tx).await?.ok_or(PayoutError::VendorNotFound(vendor_id))?;
        // A pending payout has already zeroed the balance, so it must be reported before the balance check
        if payouts::fetch_pending_payout(vendor_id, &mut tx).await?.is_some() {
            return Err(PayoutError::PayoutAlreadyPending(vendor_id));
        }
        let amount = vendor.available_for_payout;
        if !amount.is_positive() {
            return Err(PayoutError::NoBalance);
        }
        if !vendor.payment_details.is_payable() {
            return Err(PayoutError::NoPaymentMethod);
        }
        let payout = payouts::insert_payout(vendor_id, amount, &mut tx).await?;
        users::adjust_available_balance(vendor_id, -amount, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Vendor #{vendor_id} requested payout #{} of {amount}", payout.id);
        Ok(payout)
    }

    async fn resolve_payout(
        &self,
        payout_id: i64,
        decision: PayoutStatus,
        transaction_ref: Option<String>,
    ) -> Result<(Payout, Vendor), PayoutError> {
        if !matches!(decision, PayoutStatus::Completed | PayoutStatus::Rejected) {
            return Err(PayoutError::InvalidDecision(decision));
        }
        let mut tx = self.pool.begin().await?;
        let payout = match payouts::resolve_payout(payout_id, decision, transaction_ref, &mut tx).await? {
            Some(p) => p,
            None => {
                let existing = payouts::fetch_payout(payout_id, &mut tx).await?;
                tx.rollback().await?;
                return match existing {
                    Some(p) => Err(PayoutError::NotPending(payout_id, p.status)),
                    None => Err(PayoutError::PayoutNotFound(payout_id)),
                };
            },
        };
        if decision == PayoutStatus::Rejected {
            users::adjust_available_balance(payout.vendor_id, payout.amount, &mut tx).await?;
            trace!("🗃️ Payout #{payout_id} rejected. {} returned to vendor #{}", payout.amount, payout.vendor_id);
        }
        let vendor = users::fetch_vendor(payout.vendor_id, &mut tx)
            .await?
            .ok_or(PayoutError::VendorNotFound(payout.vendor_id))?;
        tx.commit().await?;
        info!("🗃️ Payout #{payout_id} resolved as {decision}");
        Ok((payout, vendor))
    }

    async fn update_payment_details(&self, vendor_id: i64, details: PaymentDetails) -> Result<Vendor, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        let vendor = users::update_payment_details(vendor_id, details, &mut conn)
            .await?
            .ok_or(PayoutError::VendorNotFound(vendor_id))?;
        Ok(vendor)
    }

    async fn fetch_vendor_balance(&self, vendor_id: i64) -> Result<Option<VendorBalance>, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        let vendor = users::fetch_vendor(vendor_id, &mut conn).await?;
        Ok(vendor.as_ref().map(VendorBalance::from))
    }

    async fn fetch_payouts_for_vendor(&self, vendor_id: i64) -> Result<Vec<Payout>, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        let result = payouts::fetch_payouts_for_vendor(vendor_id, &mut conn).await?;
        Ok(result)
    }

    async fn search_payouts(&self, status: Option<PayoutStatus>) -> Result<Vec<Payout>, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        let result = payouts::search_payouts(status, &mut conn).await?;
        Ok(result)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_orders_for_buyer(&self, buyer_id: i64) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let query = OrderQueryFilter::default().with_buyer_id(buyer_id);
        let result = orders::search_orders(query, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_orders_for_vendor(&self, vendor_id: i64) -> Result<Vec<VendorOrder>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let query = OrderQueryFilter::default().with_vendor_id(vendor_id);
        let headers = orders::search_orders(query, &mut conn).await?;
        let mut result = Vec::with_capacity(headers.len());
        for order in headers {
            let items = orders::fetch_vendor_items(order.id, vendor_id, &mut conn).await?;
            result.push(VendorOrder::new(order, items));
        }
        Ok(result)
    }

    async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = match orders::fetch_order(order_id, &mut conn).await? {
            Some(o) => o,
            None => return Ok(None),
        };
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        let history = orders::fetch_history(order_id, &mut conn).await?;
        Ok(Some(OrderDetail { order, items, history }))
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::search_orders(query, &mut conn).await?;
        Ok(result)
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_or_create_cart(&self, owner: &CartOwner) -> Result<Cart, CartError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_or_create_cart(owner, &mut conn).await?;
        Ok(cart)
    }

    async fn fetch_cart_items(&self, cart_id: i64) -> Result<Vec<CartItem>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart_items(cart_id, &mut conn).await?;
        Ok(items)
    }

    async fn add_cart_item(&self, owner: &CartOwner, product_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        if !(1..=MAX_CART_LINE_QUANTITY).contains(&quantity) {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut tx = self.pool.begin().await?;
        let cart = carts::fetch_or_create_cart(owner, &mut tx).await?;
        if products::fetch_product(product_id, &mut tx).await?.is_none() {
            return Err(CartError::ProductNotFound(product_id));
        }
        let item = carts::add_item(cart.id, product_id, quantity, &mut tx).await?;
        if item.quantity > MAX_CART_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity(item.quantity));
        }
        carts::touch_cart(cart.id, &mut tx).await?;
        tx.commit().await?;
        trace!("🛒️ {owner} now has {} of product #{product_id}", item.quantity);
        Ok(item)
    }

    async fn set_cart_item_quantity(
        &self,
        owner: &CartOwner,
        product_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartError> {
        if quantity > MAX_CART_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut tx = self.pool.begin().await?;
        let cart = carts::fetch_or_create_cart(owner, &mut tx).await?;
        let item = if quantity <= 0 {
            carts::remove_item(cart.id, product_id, &mut tx).await?;
            None
        } else {
            if products::fetch_product(product_id, &mut tx).await?.is_none() {
                return Err(CartError::ProductNotFound(product_id));
            }
            Some(carts::set_item_quantity(cart.id, product_id, quantity, &mut tx).await?)
        };
        carts::touch_cart(cart.id, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn remove_cart_item(&self, owner: &CartOwner, product_id: i64) -> Result<bool, CartError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::fetch_or_create_cart(owner, &mut tx).await?;
        let removed = carts::remove_item(cart.id, product_id, &mut tx).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn merge_guest_cart(&self, guest_token: &str, buyer_id: i64) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;
        let guest_cart = carts::deactivate_guest_cart(guest_token, &mut tx).await?;
        let buyer_cart = carts::fetch_or_create_cart(&CartOwner::Buyer(buyer_id), &mut tx).await?;
        if let Some(guest_cart) = guest_cart {
            let guest_items = carts::fetch_cart_items(guest_cart.id, &mut tx).await?;
            let buyer_items = carts::fetch_cart_items(buyer_cart.id, &mut tx).await?;
            let merged = merge_cart_lines(&to_lines(&buyer_items), &to_lines(&guest_items))?;
            for line in merged {
                carts::set_item_quantity(buyer_cart.id, line.product_id, line.quantity, &mut tx).await?;
            }
            carts::touch_cart(buyer_cart.id, &mut tx).await?;
            debug!("🛒️ Guest cart #{} merged into cart #{} for buyer #{buyer_id}", guest_cart.id, buyer_cart.id);
        } else {
            trace!("🛒️ No active guest cart for {guest_token}. Nothing to merge");
        }
        tx.commit().await?;
        Ok(buyer_cart)
    }

    async fn clear_active_cart(&self, buyer_id: i64) -> Result<u64, CartError> {
        let mut conn = self.pool.acquire().await?;
        let cleared = carts::clear_buyer_cart(buyer_id, &mut conn).await?;
        Ok(cleared)
    }
}

fn to_lines(items: &[CartItem]) -> Vec<OrderLine> {
    items.iter().map(|i| OrderLine::new(i.product_id, i.quantity)).collect()
}

impl SqliteDatabase {
    /// Creates a new database API object using the `MCS_DATABASE_URL` environment variable (or the default path).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding schema migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }

    /// All ledger credits (applied or not) recorded for an order.
    pub async fn fetch_credits_for_order(&self, order_id: i64) -> Result<Vec<LedgerCredit>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_credits_for_order(order_id, &mut conn).await
    }
}
