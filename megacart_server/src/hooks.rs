use futures::future::BoxFuture;
use log::*;
use megacart_engine::{
    events::{EventHandlers, EventHooks, OrderPaidEvent, OrderStatusChangedEvent, PayoutEvent},
    notifier::{notification_hook, LogNotifier},
};

const EVENT_BUFFER_SIZE: usize = 128;

/// Wires up the server's event hooks: every notification goes to the log notifier, and settlement, fulfilment and
/// payout events leave an audit trail in the log.
pub fn create_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_notification = Some(notification_hook(LogNotifier));
    hooks.on_order_paid(|ev| {
        let OrderPaidEvent { order, splits } = ev;
        let vendors = splits.iter().map(|s| format!("#{}: {}", s.vendor_id, s.vendor_earnings)).collect::<Vec<_>>();
        info!("📬️ Order #{} paid ({}). Vendor earnings: [{}]", order.id, order.total_amount, vendors.join(", "));
        no_op()
    });
    hooks.on_order_status_changed(|ev| {
        let OrderStatusChangedEvent { order, old_status, new_status } = ev;
        info!("📬️ Order #{} moved from {old_status} to {new_status}", order.id);
        no_op()
    });
    hooks.on_payout_updated(|ev| {
        let PayoutEvent { payout } = ev;
        info!("📬️ Payout #{} for vendor #{} ({}) is {}", payout.id, payout.vendor_id, payout.amount, payout.status);
        no_op()
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
