//! Notification port.

use async_trait::async_trait;
use domain::{Product, User};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Delivery channel of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
    System,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
            NotificationChannel::Push => "push",
            NotificationChannel::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A generic notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub channel: NotificationChannel,
    pub recipient: String,
    pub subject: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl NotificationData {
    pub fn new(
        channel: NotificationChannel,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            recipient: recipient.into(),
            subject: subject.into(),
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Adds one metadata entry.
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Errors returned by notification adapters.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The adapter cannot deliver on this channel.
    #[error("Unsupported notification channel: {0}")]
    UnsupportedChannel(NotificationChannel),

    /// Delivery was attempted and failed.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Outbound notifications.
///
/// Only [`NotificationPort::send`] is required; the typed helpers build a
/// [`NotificationData`] and forward it, and adapters override them when they
/// render a notification differently.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    /// Sends a generic notification.
    async fn send(&self, notification: NotificationData) -> Result<(), NotificationError>;

    async fn send_welcome_email(&self, user: &User) -> Result<(), NotificationError> {
        self.send(
            NotificationData::new(
                NotificationChannel::Email,
                user.email().as_str(),
                "Welcome!",
                format!("Hello {}, welcome to the platform.", user.name()),
            )
            .with_metadata("template", "welcome-user")
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
                "Product available",
                format!("{} is available again.", product.name()),
            )
            .with_metadata("template", "product-available")
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
        self.send(
            NotificationData::new(
                NotificationChannel::Email,
                user.email().as_str(),
                "Reservation confirmed",
                format!(
                    "Hello {}, your reservation of {} x {} has been confirmed.",
                    user.name(),
                    quantity,
                    product.name()
                ),
            )
            .with_metadata("template", "reservation-confirmation")
            .with_metadata("productId", product.id().as_str())
            .with_metadata("quantity", quantity),
        )
        .await
    }

    async fn send_low_stock_alert(
        &self,
        product: &Product,
        current_stock: u32,
        threshold: u32,
    ) -> Result<(), NotificationError> {
        self.send(
            NotificationData::new(
                NotificationChannel::System,
                "inventory",
                "Low stock",
                format!(
                    "{} has {} units left (threshold {}).",
                    product.name(),
                    current_stock,
                    threshold
                ),
            )
            .with_metadata("productId", product.id().as_str())
            .with_metadata("currentStock", current_stock)
            .with_metadata("threshold", threshold),
        )
        .await
    }

    /// Sends a notification without metadata.
    async fn send_simple(
        &self,
        recipient: &str,
        subject: &str,
        message: &str,
        channel: NotificationChannel,
    ) -> Result<(), NotificationError> {
        self.send(NotificationData::new(channel, recipient, subject, message))
            .await
    }
}
