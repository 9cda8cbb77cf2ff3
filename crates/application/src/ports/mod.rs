//! Ports: the capabilities use cases need from the outside world.
//!
//! Every port is an object-safe trait consumed as `Arc<dyn _>`, so adapters
//! can be swapped without touching the use cases.

pub mod event_bus;
pub mod logging;
pub mod notification;
pub mod product_repository;
pub mod user_repository;

pub use event_bus::{EventBus, EventBusError, EventHandler, HandlerError, Subscription};
pub use logging::LoggingPort;
pub use notification::{NotificationChannel, NotificationData, NotificationError, NotificationPort};
pub use product_repository::ProductRepository;
pub use user_repository::{RepositoryError, UserRepository};
