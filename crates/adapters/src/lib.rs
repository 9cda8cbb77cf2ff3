//! Adapters for the catalog service.
//!
//! This crate provides:
//! - `InMemoryEventBus`: process-local publish/subscribe
//! - `TracingLogger`: the logging port on top of `tracing`
//! - Notification adapters: console, toast and email
//! - Storage: a JSON key/value store and repositories built on it
//! - HTTP: a REST client and repositories that talk to a remote backend

pub mod event_bus;
pub mod http;
pub mod logging;
pub mod notification;
pub mod storage;

pub use event_bus::InMemoryEventBus;
pub use http::{ApiClient, ApiClientConfig, HttpError, HttpProductRepository, HttpUserRepository};
pub use logging::TracingLogger;
pub use notification::{
    ConsoleNotifier, EmailNotifier, LogToastSink, Toast, ToastNotifier, ToastSeverity, ToastSink,
};
pub use storage::{JsonStore, StorageError, StorageProductRepository, StorageUserRepository};
