//! Notifier that only logs.

use std::sync::{Mutex, PoisonError};

use application::ports::{NotificationChannel, NotificationData, NotificationError, NotificationPort};
use async_trait::async_trait;
use domain::{Product, User};

/// Logs every notification through `tracing` instead of delivering it.
///
/// Sent notifications are also kept in memory so they can be inspected.
#[derive(Debug)]
pub struct ConsoleNotifier {
    admin_recipient: String,
    sent: Mutex<Vec<NotificationData>>,
}

impl ConsoleNotifier {
    /// `admin_recipient` receives low-stock alerts.
    pub fn new(admin_recipient: impl Into<String>) -> Self {
        Self {
            admin_recipient: admin_recipient.into(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Notifications sent so far, oldest first.
    pub fn sent(&self) -> Vec<NotificationData> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl NotificationPort for ConsoleNotifier {
    async fn send(&self, notification: NotificationData) -> Result<(), NotificationError> {
        tracing::info!(
            channel = %notification.channel,
            to = %notification.recipient,
            subject = %notification.subject,
            metadata = %serde_json::Value::Object(notification.metadata.clone()),
            "{}",
            notification.content
        );
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
        Ok(())
    }

    async fn send_welcome_email(&self, user: &User) -> Result<(), NotificationError> {
        self.send(
            NotificationData::new(
                NotificationChannel::Email,
                user.email().as_str(),
                "Welcome to MEF Platform!",
                format!("Welcome {}!", user.name()),
            )
            .with_metadata("userId", user.id().as_str()),
        )
        .await
    }

    async fn send_product_available_notification(
        &self,
        user: &User,
        product: &Product,
    ) -> Result<(), NotificationError> {
        self.send(
            NotificationData::new(
                NotificationChannel::Email,
                user.email().as_str(),
                format!("Product \"{}\" is now available!", product.name()),
                format!("{} units at {}", product.stock(), product.price()),
            )
            .with_metadata("productId", product.id().as_str()),
        )
        .await
    }

    async fn send_reservation_confirmation(
        &self,
        user: &User,
        product: &Product,
        quantity: u32,
    ) -> Result<(), NotificationError> {
        let total = product
            .price()
            .multiply(f64::from(quantity))
            .map(|m| m.formatted())
            .unwrap_or_default();
        self.send(
            NotificationData::new(
                NotificationChannel::Email,
                user.email().as_str(),
                format!("Reservation confirmed for {}", product.name()),
                format!("{quantity} x {} ({total})", product.name()),
            )
            .with_metadata("productId", product.id().as_str())
            .with_metadata("quantity", quantity)
            .with_metadata("totalPrice", total),
        )
        .await
    }

    async fn send_low_stock_alert(
        &self,
        product: &Product,
        current_stock: u32,
        threshold: u32,
    ) -> Result<(), NotificationError> {
        let severity = if current_stock == 0 { "CRITICAL" } else { "WARNING" };
        self.send(
            NotificationData::new(
                NotificationChannel::Email,
                self.admin_recipient.as_str(),
                format!("LOW STOCK ALERT: {}", product.name()),
                format!("{current_stock} left, threshold {threshold}"),
            )
            .with_metadata("productId", product.id().as_str())
            .with_metadata("severity", severity),
        )
        .await
    }
}
