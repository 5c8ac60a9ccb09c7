use cucumber::given;
use megacart_engine::{
    db_types::Money,
    test_utils::{seed_buyer, seed_vendor},
};

use crate::{cucumber::MarketWorld, support::Market};

#[given("a fresh install")]
async fn fresh_database(world: &mut MarketWorld) {
    world.system = Some(Market::new().await);
}

#[given(expr = "a vendor '{word}' selling '{word}' for {word} with {int} in stock")]
async fn vendor_with_product(world: &mut MarketWorld, email: String, product: String, price: String, stock: i64) {
    let price: Money = price.parse().expect("Not a valid amount");
    let shop = seed_vendor(&world.market().db, &email, &[(product.as_str(), price.value(), stock)]).await;
    world.users.insert(email, shop.vendor.user_id);
    world.products.insert(product, shop.products[0].id);
}

#[given(expr = "a buyer '{word}'")]
async fn buyer(world: &mut MarketWorld, email: String) {
    let user = seed_buyer(&world.market().db, &email).await;
    world.users.insert(email, user.id);
}
