//! Email notifications delivered through the backend's email endpoint.

use application::ports::{NotificationChannel, NotificationData, NotificationError, NotificationPort};
use async_trait::async_trait;
use chrono::Utc;
use domain::{Product, User};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::http::ApiClient;

const EMAIL_ENDPOINT: &str = "notifications/email";

/// Request body of `POST notifications/email`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPayload {
    pub to: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_data: Option<Value>,
}

impl EmailPayload {
    fn templated(to: &str, subject: String, template: &str, data: Value) -> Self {
        Self {
            to: to.to_string(),
            subject,
            body: None,
            template: Some(template.to_string()),
            template_data: Some(data),
        }
    }
}

/// Sends email through the REST backend. Only the email channel is supported.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    client: ApiClient,
    admin_recipient: String,
}

impl EmailNotifier {
    /// `admin_recipient` receives low-stock alerts.
    pub fn new(client: ApiClient, admin_recipient: impl Into<String>) -> Self {
        Self {
            client,
            admin_recipient: admin_recipient.into(),
        }
    }

    #[tracing::instrument(skip(self, payload), fields(to = %payload.to, template = ?payload.template))]
    async fn deliver(&self, payload: EmailPayload) -> Result<(), NotificationError> {
        self.client
            .post::<_, Value>(EMAIL_ENDPOINT, &payload)
            .await
            .map(|_| ())
            .map_err(|err| {
                NotificationError::Delivery(format!("email to {} failed: {err}", payload.to))
            })
    }
}

#[async_trait]
impl NotificationPort for EmailNotifier {
    async fn send(&self, notification: NotificationData) -> Result<(), NotificationError> {
        if notification.channel != NotificationChannel::Email {
            return Err(NotificationError::UnsupportedChannel(notification.channel));
        }
        let template_data = if notification.metadata.is_empty() {
            None
        } else {
            Some(Value::Object(notification.metadata))
        };
        self.deliver(EmailPayload {
            to: notification.recipient,
            subject: notification.subject,
            body: Some(notification.content),
            template: None,
            template_data,
        })
        .await
    }

    async fn send_welcome_email(&self, user: &User) -> Result<(), NotificationError> {
        self.deliver(EmailPayload::templated(
            user.email().as_str(),
            "Welcome to MEF Platform!".to_string(),
            "welcome",
            json!({
                "userName": user.name(),
                "userEmail": user.email().as_str(),
                "userId": user.id().as_str(),
            }),
        ))
        .await
    }

    async fn send_product_available_notification(
        &self,
        user: &User,
        product: &Product,
    ) -> Result<(), NotificationError> {
        self.deliver(EmailPayload::templated(
            user.email().as_str(),
            format!("{} is now available!", product.name()),
            "product-available",
            json!({
                "userName": user.name(),
                "productName": product.name(),
                "productDescription": product.description(),
                "productPrice": product.price().formatted(),
                "productId": product.id().as_str(),
            }),
        ))
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
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;
        let now = Utc::now();
        self.deliver(EmailPayload::templated(
            user.email().as_str(),
            format!("Reservation Confirmed: {}", product.name()),
            "reservation-confirmation",
            json!({
                "userName": user.name(),
                "productName": product.name(),
                "productDescription": product.description(),
                "quantity": quantity,
                "unitPrice": product.price().formatted(),
                "totalPrice": total.formatted(),
                "reservationDate": now.format("%Y-%m-%d").to_string(),
                "reservationTime": now.format("%H:%M:%S").to_string(),
                "productId": product.id().as_str(),
            }),
        ))
        .await
    }

    async fn send_low_stock_alert(
        &self,
        product: &Product,
        current_stock: u32,
        threshold: u32,
    ) -> Result<(), NotificationError> {
        let (stock_status, severity) = if current_stock == 0 {
            ("OUT_OF_STOCK", "CRITICAL")
        } else {
            ("LOW_STOCK", "WARNING")
        };
        self.deliver(EmailPayload::templated(
            &self.admin_recipient,
            format!("LOW STOCK ALERT: {}", product.name()),
            "low-stock-alert",
            json!({
                "productName": product.name(),
                "productId": product.id().as_str(),
                "currentStock": current_stock,
                "threshold": threshold,
                "stockStatus": stock_status,
                "severity": severity,
                "productPrice": product.price().formatted(),
                "alertDate": Utc::now().to_rfc3339(),
            }),
        ))
        .await
    }
}
