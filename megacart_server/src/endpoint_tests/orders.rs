use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use megacart_engine::{
    db_types::{Json, Money, Order, OrderItem, OrderStatusType, Principal, ShippingAddress},
    traits::{OrderDetail, VendorOrder},
    AccountApi,
};
use serde_json::Value;

use super::{
    helpers::{get_request, As},
    mocks::MockAccountManager,
};
use crate::routes::{MyOrdersRoute, OrderByIdRoute, OrdersSearchRoute, VendorOrdersRoute};

#[actix_web::test]
async fn fetch_my_orders_no_headers() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders", As::Anonymous, configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No principal was supplied"));
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders", As::Signed(Principal::buyer(1)), configure).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Value = serde_json::from_str(&body).unwrap();
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], 7);
    assert_eq!(orders[0]["total_amount"], 25_000);
    assert_eq!(orders[0]["status"], "Paid");
    // The gateway signature never leaves the server
    assert!(orders[0].get("gateway_signature").is_none());
}

#[actix_web::test]
async fn fetch_my_orders_invalid_sig() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders", As::Forged(Principal::buyer(1)), configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Signature does not match"));
}

#[actix_web::test]
async fn vendors_cannot_use_buyer_order_list() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders", As::Signed(Principal::vendor(5)), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Buyer role required"), "{body}");
}

#[actix_web::test]
async fn vendor_orders_only_show_own_items() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/vendor/orders", As::Signed(Principal::vendor(5)), configure).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(orders[0]["items"].as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["vendor_subtotal"], 15_000);
}

#[actix_web::test]
async fn order_detail_for_the_owner() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/order/7", As::Signed(Principal::buyer(1)), configure).await;
    assert_eq!(status, StatusCode::OK);
    let detail: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(detail["items"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn order_detail_for_another_buyer() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("/order/7", As::Signed(Principal::buyer(2)), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn order_detail_for_a_vendor_is_filtered() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/order/7", As::Signed(Principal::vendor(6)), configure).await;
    assert_eq!(status, StatusCode::OK);
    let detail: Value = serde_json::from_str(&body).unwrap();
    let items = detail["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["vendor_id"], 6);
}

#[actix_web::test]
async fn order_detail_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/order/99", As::Signed(Principal::admin(9)), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Order 99 does not exist"));
}

#[actix_web::test]
async fn search_orders_as_admin() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("/search/orders?vendor_id=5&status=Paid,Shipped", As::Signed(Principal::admin(9)), configure)
            .await;
    assert_eq!(status, StatusCode::OK);
    let orders: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn search_orders_with_unknown_status() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/search/orders?status=Lost", As::Signed(Principal::admin(9)), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid order status: Lost"));
}

#[actix_web::test]
async fn search_orders_as_buyer() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("/search/orders", As::Signed(Principal::buyer(1)), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_fetch_orders_for_buyer().withf(|id| *id == 1).returning(|_| Ok(vec![order()]));
    account_manager.expect_fetch_orders_for_vendor().withf(|id| *id == 5).returning(|_| {
        let items = items().into_iter().filter(|i| i.vendor_id == 5).collect();
        Ok(vec![VendorOrder::new(order(), items)])
    });
    account_manager.expect_fetch_order_detail().returning(|id| {
        if id == 7 {
            Ok(Some(OrderDetail { order: order(), items: items(), history: vec![] }))
        } else {
            Ok(None)
        }
    });
    account_manager
        .expect_search_orders()
        .withf(|q| q.vendor_id == Some(5) && q.status.as_ref().map(|s| s.len()) == Some(2))
        .returning(|_| Ok(vec![order()]));
    let accounts_api = AccountApi::new(account_manager);
    cfg.service(MyOrdersRoute::<MockAccountManager>::new())
        .service(VendorOrdersRoute::<MockAccountManager>::new())
        .service(OrdersSearchRoute::<MockAccountManager>::new())
        .service(OrderByIdRoute::<MockAccountManager>::new())
        .app_data(web::Data::new(accounts_api));
}

fn order() -> Order {
    let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    Order {
        id: 7,
        buyer_id: 1,
        total_amount: Money::from(25_000),
        status: OrderStatusType::Paid,
        shipping_address: Json(ShippingAddress {
            full_name: "Asha Rao".into(),
            line1: "12 MG Road".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            postal_code: "560001".into(),
            country: "IN".into(),
            ..Default::default()
        }),
        gateway_order_id: Some("order_mock000007".into()),
        gateway_payment_id: Some("pay_0007".into()),
        gateway_signature: Some("deadbeef".into()),
        tracking_number: None,
        created_at,
        updated_at: created_at,
    }
}

fn items() -> Vec<OrderItem> {
    let item = |id: i64, vendor_id: i64, price: i64| OrderItem {
        id,
        order_id: 7,
        product_id: id * 10,
        product_name: format!("Product {id}"),
        product_image: None,
        vendor_id,
        quantity: 1,
        price: Money::from(price),
    };
    vec![item(1, 5, 15_000), item(2, 6, 10_000)]
}
