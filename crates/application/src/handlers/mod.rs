//! Event handlers reacting to domain events with side effects.

mod product_reserved;
mod user_activated;
mod user_created;

pub use product_reserved::ProductReservedHandler;
pub use user_activated::UserActivatedHandler;
pub use user_created::UserCreatedHandler;

use std::sync::Arc;

use crate::ports::{EventHandler, LoggingPort, NotificationPort};
use crate::settings::ApplicationSettings;

/// Builds one instance of every handler.
pub fn default_handlers(
    notifier: Arc<dyn NotificationPort>,
    logger: &dyn LoggingPort,
    settings: &ApplicationSettings,
) -> Vec<Arc<dyn EventHandler>> {
    vec![
        Arc::new(UserCreatedHandler::new(
            Arc::clone(&notifier),
            logger,
            settings.admin_recipient.as_str(),
            settings.institutional_domain.as_str(),
        )),
        Arc::new(UserActivatedHandler::new(Arc::clone(&notifier), logger)),
        Arc::new(ProductReservedHandler::new(notifier, logger)),
    ]
}
