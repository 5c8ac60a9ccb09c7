use cucumber::{given, then, when};
use megacart_engine::{
    db_types::{Money, OrderLine, OrderStatusType, PayoutStatus, Principal},
    CatalogManagement,
    OrderManagement,
};

use crate::cucumber::MarketWorld;

fn money(s: &str) -> Money {
    s.parse().expect("Not a valid amount")
}

#[given(expr = "'{word}' checks out {int} '{word}' for {word}")]
#[when(expr = "'{word}' checks out {int} '{word}' for {word}")]
async fn checkout(world: &mut MarketWorld, email: String, quantity: i64, product: String, total: String) {
    let buyer = world.buyer(&email);
    let line = OrderLine::new(world.product_id(&product), quantity);
    let total = money(&total).value();
    match world.market().place_order(&buyer, vec![line], total).await {
        Ok(result) => {
            world.last_checkout = Some(result);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[given(expr = "'{word}' pays for the order with payment '{word}'")]
#[when(expr = "'{word}' pays for the order with payment '{word}'")]
async fn pay(world: &mut MarketWorld, email: String, payment_id: String) {
    let buyer = world.buyer(&email);
    let checkout = world.checkout().clone();
    world.last_error = world.market().pay(&buyer, &checkout, &payment_id).await.err().map(|e| e.to_string());
}

#[when(expr = "vendor '{word}' marks the order {word} with tracking '{word}'")]
async fn ship_with_tracking(world: &mut MarketWorld, email: String, status: String, tracking: String) {
    update_status(world, &email, &status, Some(tracking)).await;
}

#[when(expr = "vendor '{word}' marks the order {word}")]
async fn mark_order(world: &mut MarketWorld, email: String, status: String) {
    update_status(world, &email, &status, None).await;
}

async fn update_status(world: &mut MarketWorld, email: &str, status: &str, tracking: Option<String>) {
    let vendor = world.vendor(email);
    let status: OrderStatusType = status.parse().expect("Not a valid order status");
    let order_id = world.checkout().order_id;
    let result = world.market().fulfilment.update_order_status(&vendor, order_id, status, tracking).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when(expr = "vendor '{word}' requests a payout")]
async fn request_payout(world: &mut MarketWorld, email: String) {
    let vendor = world.vendor(&email);
    match world.market().payouts.request_payout(&vendor).await {
        Ok(payout) => {
            world.last_payout = Some(payout);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "the admin resolves the payout as {word}")]
async fn resolve_payout(world: &mut MarketWorld, decision: String) {
    let decision: PayoutStatus = decision.parse().expect("Not a valid payout status");
    let payout_id = world.last_payout.as_ref().expect("No payout has been requested").id;
    let admin = Principal::admin(0);
    match world.market().payouts.resolve_payout(&admin, payout_id, decision, None).await {
        Ok(payout) => {
            world.last_payout = Some(payout);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[then(expr = "the order is {word}")]
async fn order_status(world: &mut MarketWorld, status: String) {
    let status: OrderStatusType = status.parse().expect("Not a valid order status");
    let order_id = world.checkout().order_id;
    let order = world.market().db.fetch_order(order_id).await.expect("Error fetching order");
    assert_eq!(order.map(|o| o.status), Some(status));
}

#[then(expr = "vendor '{word}' has {word} available for payout")]
async fn available_balance(world: &mut MarketWorld, email: String, amount: String) {
    let vendor = world.vendor(&email);
    let balance = world.market().payouts.vendor_balance(&vendor).await.expect("Error fetching balance");
    assert_eq!(balance.available_for_payout, money(&amount));
}

#[then(expr = "the platform fee on the order is {word}")]
async fn platform_fee(world: &mut MarketWorld, amount: String) {
    let order_id = world.checkout().order_id;
    let credits = world.market().db.fetch_credits_for_order(order_id).await.expect("Error fetching credits");
    let fee: Money = credits.iter().map(|c| c.platform_fee).sum();
    assert_eq!(fee, money(&amount));
}

#[then(expr = "'{word}' has {int} in stock")]
async fn stock_level(world: &mut MarketWorld, product: String, stock: i64) {
    let product_id = world.product_id(&product);
    let product = world.market().db.fetch_product(product_id).await.expect("Error fetching product");
    assert_eq!(product.map(|p| p.stock), Some(stock));
}

#[then(expr = "the payout is {word} for {word}")]
async fn payout_state(world: &mut MarketWorld, status: String, amount: String) {
    let payout = world.last_payout.as_ref().expect("No payout has been requested");
    assert_eq!(payout.status.to_string(), status);
    assert_eq!(payout.amount, money(&amount));
}

#[then(expr = "the last request fails with {string}")]
async fn last_request_failed(world: &mut MarketWorld, message: String) {
    let err = world.last_error.as_ref().expect("The last request succeeded");
    assert!(err.contains(&message), "Expected \"{message}\" in \"{err}\"");
}

#[then("the last request succeeded")]
async fn last_request_succeeded(world: &mut MarketWorld) {
    assert!(world.last_error.is_none(), "{:?}", world.last_error);
}
