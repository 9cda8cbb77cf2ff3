//! Short user-facing notifications ("toasts").

use std::sync::Arc;
use std::time::Duration;

use application::ports::{NotificationData, NotificationError, NotificationPort};
use async_trait::async_trait;
use domain::{Product, User};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastSeverity {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastSeverity::Success => "success",
            ToastSeverity::Error => "error",
            ToastSeverity::Warning => "warning",
            ToastSeverity::Info => "info",
        }
    }
}

/// A message shown to the user for a limited time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub severity: ToastSeverity,
    pub message: String,
    pub duration: Duration,
}

impl Toast {
    fn new(severity: ToastSeverity, message: String, millis: u64) -> Self {
        Self {
            severity,
            message,
            duration: Duration::from_millis(millis),
        }
    }
}

/// Displays toasts.
pub trait ToastSink: Send + Sync {
    fn show(&self, toast: Toast);
}

/// Sink used when no display is attached: writes `[SEVERITY] message` to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogToastSink;

impl ToastSink for LogToastSink {
    fn show(&self, toast: Toast) {
        tracing::info!(
            duration_ms = toast.duration.as_millis() as u64,
            "[{}] {}",
            toast.severity.as_str().to_uppercase(),
            toast.message
        );
    }
}

/// Turns notifications into toasts handed to a [`ToastSink`].
#[derive(Clone)]
pub struct ToastNotifier {
    sink: Arc<dyn ToastSink>,
}

impl ToastNotifier {
    pub fn new(sink: Arc<dyn ToastSink>) -> Self {
        Self { sink }
    }
}

impl Default for ToastNotifier {
    fn default() -> Self {
        Self::new(Arc::new(LogToastSink))
    }
}

#[async_trait]
impl NotificationPort for ToastNotifier {
    async fn send(&self, notification: NotificationData) -> Result<(), NotificationError> {
        let message = if notification.subject.is_empty() {
            notification.content
        } else {
            format!("{}: {}", notification.subject, notification.content)
        };
        self.sink.show(Toast::new(ToastSeverity::Info, message, 3000));
        Ok(())
    }

    async fn send_welcome_email(&self, user: &User) -> Result<(), NotificationError> {
        let message = format!("Welcome {}! Check your email for confirmation.", user.name());
        self.sink.show(Toast::new(ToastSeverity::Success, message, 5000));
        Ok(())
    }

    async fn send_product_available_notification(
        &self,
        _user: &User,
        product: &Product,
    ) -> Result<(), NotificationError> {
        let message = format!("Good news! \"{}\" is now available.", product.name());
        self.sink.show(Toast::new(ToastSeverity::Info, message, 4000));
        Ok(())
    }

    async fn send_reservation_confirmation(
        &self,
        _user: &User,
        product: &Product,
        quantity: u32,
    ) -> Result<(), NotificationError> {
        let message = format!("Reserved {quantity}x \"{}\" successfully!", product.name());
        self.sink.show(Toast::new(ToastSeverity::Success, message, 4000));
        Ok(())
    }

    async fn send_low_stock_alert(
        &self,
        product: &Product,
        current_stock: u32,
        _threshold: u32,
    ) -> Result<(), NotificationError> {
        let message = if current_stock == 0 {
            format!("\"{}\" is out of stock!", product.name())
        } else {
            format!(
                "Low stock alert: \"{}\" ({current_stock} left)",
                product.name()
            )
        };
        self.sink.show(Toast::new(ToastSeverity::Warning, message, 6000));
        Ok(())
    }
}
