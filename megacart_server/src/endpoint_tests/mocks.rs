use megacart_engine::{
    db_types::{Cart, CartItem, CartOwner, Order},
    order_objects::OrderQueryFilter,
    traits::{AccountApiError, AccountManagement, CartError, CartManagement, OrderDetail, VendorOrder},
};
use mockall::mock;

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn fetch_orders_for_buyer(&self, buyer_id: i64) -> Result<Vec<Order>, AccountApiError>;
        async fn fetch_orders_for_vendor(&self, vendor_id: i64) -> Result<Vec<VendorOrder>, AccountApiError>;
        async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, AccountApiError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError>;
    }
}

mock! {
    pub CartManager {}
    impl CartManagement for CartManager {
        async fn fetch_or_create_cart(&self, owner: &CartOwner) -> Result<Cart, CartError>;
        async fn fetch_cart_items(&self, cart_id: i64) -> Result<Vec<CartItem>, CartError>;
        async fn add_cart_item(&self, owner: &CartOwner, product_id: i64, quantity: i64) -> Result<CartItem, CartError>;
        async fn set_cart_item_quantity(&self, owner: &CartOwner, product_id: i64, quantity: i64) -> Result<Option<CartItem>, CartError>;
        async fn remove_cart_item(&self, owner: &CartOwner, product_id: i64) -> Result<bool, CartError>;
        async fn merge_guest_cart(&self, guest_token: &str, buyer_id: i64) -> Result<Cart, CartError>;
        async fn clear_active_cart(&self, buyer_id: i64) -> Result<u64, CartError>;
    }
}
