use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
    time::Duration,
};

use log::*;
use megacart_engine::{
    db_types::{OrderLine, OrderStatusType, Principal},
    events::{EventHandlers, EventHooks},
    notifier::notification_hook,
    test_utils::{seed_buyer, seed_vendor, RecordingNotifier},
};

use crate::support::{Market, OPERATOR_EMAIL};

mod support;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::SeqCst)
    }
}

/// Hooks run on their own tasks, so give them a moment to catch up.
async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

#[tokio::test]
async fn settlement_and_fulfilment_fire_hooks() {
    let paid = HookCalled::default();
    let status_changed = HookCalled::default();
    let payouts = HookCalled::default();
    let notifier = RecordingNotifier::new();

    let mut hooks = EventHooks::default();
    let paid_copy = paid.clone();
    hooks.on_order_paid(move |ev| {
        info!("🪝️ Order #{} paid with {} splits", ev.order.id, ev.splits.len());
        paid_copy.called();
        Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let status_copy = status_changed.clone();
    hooks.on_order_status_changed(move |ev| {
        info!("🪝️ Order #{} {} -> {}", ev.order.id, ev.old_status, ev.new_status);
        status_copy.called();
        Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let payouts_copy = payouts.clone();
    hooks.on_payout_updated(move |ev| {
        info!("🪝️ Payout #{} is {}", ev.payout.id, ev.payout.status);
        payouts_copy.called();
        Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_notification = Some(notification_hook(notifier.clone()));
    let handlers = EventHandlers::new(32, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let market = Market::with_producers(producers).await;
    let shop = seed_vendor(&market.db, "hooks@shop.in", &[("Incense", 300, 10)]).await;
    let vendor = Principal::vendor(shop.vendor.user_id);
    let buyer = Principal::buyer(seed_buyer(&market.db, "hooks@mail.in").await.id);
    let checkout = market.place_order(&buyer, vec![OrderLine::new(shop.products[0].id, 2)], 600).await.unwrap();
    market.pay(&buyer, &checkout, "pay_hooks").await.unwrap();
    market
        .fulfilment
        .update_order_status(&vendor, checkout.order_id, OrderStatusType::Shipped, Some("BD-77".into()))
        .await
        .unwrap();
    market.payouts.request_payout(&vendor).await.unwrap();

    assert!(wait_for(|| paid.count() == 1).await, "order paid hook was not called");
    assert!(wait_for(|| status_changed.count() == 1).await, "status hook was not called");
    assert!(wait_for(|| payouts.count() == 1).await, "payout hook was not called");
    assert!(wait_for(|| notifier.sent().len() == 5).await, "{:?}", notifier.sent());

    let vendor_mail = notifier.sent_to("hooks@shop.in");
    assert_eq!(vendor_mail.len(), 2);
    assert_eq!(vendor_mail[0].subject, format!("[MegaCart] New Order Received! (Order ID: {})", checkout.order_id));
    let buyer_mail = notifier.sent_to("hooks@mail.in");
    assert_eq!(buyer_mail.len(), 2);
    assert!(buyer_mail[1].body.contains("BD-77"));
    assert_eq!(notifier.sent_to(OPERATOR_EMAIL).len(), 1);
    market.tear_down().await;
    info!("🪝️ test complete");
}

#[tokio::test]
async fn failed_payment_sends_no_notifications() {
    let notifier = RecordingNotifier::new();
    let mut hooks = EventHooks::default();
    hooks.on_notification = Some(notification_hook(notifier.clone()));
    let handlers = EventHandlers::new(8, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let market = Market::with_producers(producers).await;
    let shop = seed_vendor(&market.db, "quiet@shop.in", &[("Bell", 250, 2)]).await;
    let buyer = Principal::buyer(seed_buyer(&market.db, "quiet@mail.in").await.id);
    let checkout = market.place_order(&buyer, vec![OrderLine::new(shop.products[0].id, 1)], 250).await.unwrap();
    market.gateway.set_unreachable(true);
    assert!(market.pay(&buyer, &checkout, "pay_quiet").await.is_err());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(notifier.sent().is_empty());
    market.tear_down().await;
}
