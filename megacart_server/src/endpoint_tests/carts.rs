use actix_web::{
    http::{Method, StatusCode},
    web,
    web::ServiceConfig,
};
use chrono::{TimeZone, Utc};
use megacart_engine::{
    db_types::{Cart, CartItem, CartOwner, Principal},
    CartApi,
    CartError,
};
use serde_json::{json, Value};

use super::{
    helpers::{get_request, send, As},
    mocks::MockCartManager,
};
use crate::routes::{guest_token as guest_token_route, AddCartItemRoute, GetCartRoute, MergeCartRoute, RemoveCartItemRoute};

const GUEST: &str = "guestTokenABC123";

#[actix_web::test]
async fn issue_guest_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/guest_token", As::Anonymous, configure).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert!(!body["guest_token"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn guest_cart() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/cart", As::Guest(GUEST), configure).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["cart"]["guest_token"], GUEST);
    assert_eq!(body["items"][0]["quantity"], 2);
}

#[actix_web::test]
async fn anonymous_cart_needs_a_guest_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/cart", As::Anonymous, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("x-guest-token"));
}

#[actix_web::test]
async fn vendors_do_not_have_carts() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("/cart", As::Signed(Principal::vendor(5)), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn buyer_adds_item() {
    let _ = env_logger::try_init().ok();
    let body = json!({"product_id": 30, "quantity": 3});
    let (status, body) = send(Method::POST, "/cart/items", As::Signed(Principal::buyer(1)), Some(body), configure).await;
    assert_eq!(status, StatusCode::OK);
    let item: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(item["product_id"], 30);
    assert_eq!(item["quantity"], 3);
}

#[actix_web::test]
async fn adding_unknown_product() {
    let _ = env_logger::try_init().ok();
    let body = json!({"product_id": 404, "quantity": 1});
    let (status, body) = send(Method::POST, "/cart/items", As::Guest(GUEST), Some(body), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Product 404 does not exist"));
}

#[actix_web::test]
async fn remove_item() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(Method::DELETE, "/cart/items/30", As::Guest(GUEST), None, configure).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["success"], true);
}

#[actix_web::test]
async fn merge_guest_cart_into_buyer_cart() {
    let _ = env_logger::try_init().ok();
    let body = json!({"guest_token": GUEST});
    let (status, body) = send(Method::POST, "/cart/merge", As::Signed(Principal::buyer(1)), Some(body), configure).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["cart"]["buyer_id"], 1);
}

#[actix_web::test]
async fn guests_cannot_merge() {
    let _ = env_logger::try_init().ok();
    let body = json!({"guest_token": GUEST});
    let (status, _) = send(Method::POST, "/cart/merge", As::Guest(GUEST), Some(body), configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut cart_manager = MockCartManager::new();
    cart_manager.expect_fetch_or_create_cart().returning(|owner| Ok(cart_for(owner)));
    cart_manager
        .expect_fetch_cart_items()
        .returning(|cart_id| Ok(vec![CartItem { id: 1, cart_id, product_id: 30, quantity: 2 }]));
    cart_manager.expect_add_cart_item().returning(|_, product_id, quantity| {
        if product_id == 404 {
            Err(CartError::ProductNotFound(product_id))
        } else {
            Ok(CartItem { id: 2, cart_id: 1, product_id, quantity })
        }
    });
    cart_manager.expect_remove_cart_item().returning(|_, product_id| Ok(product_id == 30));
    cart_manager
        .expect_merge_guest_cart()
        .withf(|token, buyer_id| token == GUEST && *buyer_id == 1)
        .returning(|_, buyer_id| Ok(cart_for(&CartOwner::Buyer(buyer_id))));
    let cart_api = CartApi::new(cart_manager);
    cfg.service(GetCartRoute::<MockCartManager>::new())
        .service(AddCartItemRoute::<MockCartManager>::new())
        .service(RemoveCartItemRoute::<MockCartManager>::new())
        .service(MergeCartRoute::<MockCartManager>::new())
        .service(guest_token_route)
        .app_data(web::Data::new(cart_api));
}

fn cart_for(owner: &CartOwner) -> Cart {
    let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let (buyer_id, guest_token) = match owner {
        CartOwner::Buyer(id) => (Some(*id), None),
        CartOwner::Guest(token) => (None, Some(token.clone())),
    };
    Cart { id: 1, buyer_id, guest_token, is_active: true, created_at, updated_at: created_at }
}
