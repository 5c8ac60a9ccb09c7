//! Best-effort outbound notifications.
//!
//! The engine never calls a [`Notifier`] directly. APIs publish [`Notification`]s through their event producers, and
//! [`notification_hook`] turns a notifier into the handler that drains them. A broken mail server therefore only
//! ever produces a log line.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use thiserror::Error;

use crate::{
    db_types::{Order, OrderStatusType, Payout, PayoutStatus, VendorSplit},
    events::{Handler, Notification},
};

const SUBJECT_PREFIX: &str = "[MegaCart]";

#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("Could not deliver message to {recipient}: {reason}")]
    DeliveryFailed { recipient: String, reason: String },
}

pub trait Notifier {
    fn send(&self, notification: &Notification) -> impl Future<Output = Result<(), NotifierError>> + Send;
}

/// Writes every notification to the log. Used when no mail transport is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifierError> {
        info!("📧️ To: {} | {}\n{}", notification.recipient, notification.subject, notification.body);
        Ok(())
    }
}

/// Builds the event hook that hands each published notification to `notifier`. Delivery errors are logged and
/// dropped.
pub fn notification_hook<N>(notifier: N) -> Handler<Notification>
where N: Notifier + Send + Sync + 'static {
    let notifier = Arc::new(notifier);
    Arc::new(move |notification: Notification| {
        let notifier = Arc::clone(&notifier);
        Box::pin(async move {
            match notifier.send(&notification).await {
                Ok(()) => trace!("📧️ Notification \"{}\" sent to {}", notification.subject, notification.recipient),
                Err(e) => warn!("📧️ Notification \"{}\" was not delivered. {e}", notification.subject),
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    })
}

//--------------------------------------    Message templates  ---------------------------------------------------------

pub fn vendor_new_order(email: &str, order: &Order, split: &VendorSplit) -> Notification {
    let subject = format!("{SUBJECT_PREFIX} New Order Received! (Order ID: {})", order.id);
    let body = format!(
        "You have a new paid order #{}.\n\nYour items: {}\nPlatform commission: {}\nYour earnings: {}\n\nPlease ship \
         the items and add a tracking number.",
        order.id, split.subtotal, split.platform_fee, split.vendor_earnings
    );
    Notification::new(email.to_string(), subject, body)
}

pub fn buyer_order_paid(email: &str, order: &Order) -> Notification {
    let subject = format!("{SUBJECT_PREFIX} Payment received for order #{}", order.id);
    let body = format!(
        "Thank you! We have received your payment of {} for order #{}. We will let you know when it ships.",
        order.total_amount, order.id
    );
    Notification::new(email.to_string(), subject, body)
}

pub fn operator_order_summary(email: &str, order: &Order, splits: &[VendorSplit]) -> Notification {
    let subject = format!("{SUBJECT_PREFIX} Order #{} settled", order.id);
    let mut body = format!("Order #{} paid in full: {}\n", order.id, order.total_amount);
    for split in splits {
        body.push_str(&format!(
            "  vendor #{}: sales {} fee {} earnings {}\n",
            split.vendor_id, split.subtotal, split.platform_fee, split.vendor_earnings
        ));
    }
    Notification::new(email.to_string(), subject, body)
}

pub fn buyer_status_update(email: &str, order: &Order) -> Notification {
    let (subject, body) = match order.status {
        OrderStatusType::Shipped => (
            format!("{SUBJECT_PREFIX} Your order #{} has shipped", order.id),
            format!(
                "Good news! Order #{} is on its way. Tracking number: {}",
                order.id,
                order.tracking_number.as_deref().unwrap_or("n/a")
            ),
        ),
        OrderStatusType::Delivered => (
            format!("{SUBJECT_PREFIX} Your order #{} has been delivered", order.id),
            format!("Order #{} has been delivered. We hope you enjoy it!", order.id),
        ),
        other => (
            format!("{SUBJECT_PREFIX} Order #{} update", order.id),
            format!("Order #{} is now {other}.", order.id),
        ),
    };
    Notification::new(email.to_string(), subject, body)
}

pub fn vendor_payout_update(email: &str, payout: &Payout) -> Notification {
    let subject = format!("{SUBJECT_PREFIX} Payout #{} {}", payout.id, payout.status);
    let body = match payout.status {
        PayoutStatus::Pending => format!("Your payout request of {} has been received.", payout.amount),
        PayoutStatus::Completed => format!(
            "Your payout of {} has been sent. Reference: {}",
            payout.amount,
            payout.transaction_ref.as_deref().unwrap_or("n/a")
        ),
        PayoutStatus::Rejected => {
            format!("Your payout request of {} was rejected. The amount is back in your balance.", payout.amount)
        },
        PayoutStatus::Failed => format!("Your payout of {} failed.", payout.amount),
    };
    Notification::new(email.to_string(), subject, body)
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use sqlx::types::Json;

    use super::*;
    use crate::db_types::{Money, ShippingAddress};

    fn order() -> Order {
        Order {
            id: 17,
            buyer_id: 1,
            total_amount: Money::from(25_000),
            status: OrderStatusType::Shipped,
            shipping_address: Json(ShippingAddress::default()),
            gateway_order_id: Some("order_x".into()),
            gateway_payment_id: None,
            gateway_signature: None,
            tracking_number: Some("TRK-1".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn vendor_subject_names_the_order() {
        let split = VendorSplit {
            vendor_id: 3,
            subtotal: Money::from(25_000),
            platform_fee: Money::from(2_500),
            vendor_earnings: Money::from(22_500),
        };
        let n = vendor_new_order("shop@example.com", &order(), &split);
        assert_eq!(n.subject, "[MegaCart] New Order Received! (Order ID: 17)");
        assert!(n.body.contains("225.00"));
        assert_eq!(n.recipient, "shop@example.com");
    }

    #[test]
    fn shipped_message_has_tracking_number() {
        let n = buyer_status_update("buyer@example.com", &order());
        assert!(n.subject.contains("shipped"));
        assert!(n.body.contains("TRK-1"));
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), NotifierError> {
            Err(NotifierError::DeliveryFailed { recipient: notification.recipient.clone(), reason: "smtp down".into() })
        }
    }

    #[tokio::test]
    async fn delivery_failures_are_swallowed() {
        let _ = env_logger::try_init();
        let hook = notification_hook(FailingNotifier);
        (hook)(Notification::new("a@b.c", "subject", "body")).await;
        let hook = notification_hook(LogNotifier);
        (hook)(Notification::new("a@b.c", "subject", "body")).await;
    }
}
