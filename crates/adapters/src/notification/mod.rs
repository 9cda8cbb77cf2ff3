//! Notification adapters.

mod console;
mod email;
mod toast;

pub use console::ConsoleNotifier;
pub use email::{EmailNotifier, EmailPayload};
pub use toast::{LogToastSink, Toast, ToastNotifier, ToastSeverity, ToastSink};
