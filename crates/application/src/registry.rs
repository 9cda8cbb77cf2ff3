//! Registration of event handlers on the event bus.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use domain::DomainEvent;
use serde::Serialize;
use serde_json::json;

use crate::ports::{EventBus, EventHandler, HandlerError, LoggingPort, Subscription};

/// Description of a registered handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerInfo {
    pub event_type: String,
    pub handler_name: String,
}

struct Registration {
    info: HandlerInfo,
    subscription: Subscription,
}

/// Subscribes handlers to the bus, at most one per event type.
///
/// Each handler is wrapped so that every execution is logged with its
/// outcome. Failures are still returned to the bus.
pub struct EventHandlerRegistry {
    bus: Arc<dyn EventBus>,
    logger: Arc<dyn LoggingPort>,
    registrations: Mutex<Vec<Registration>>,
}

impl EventHandlerRegistry {
    pub fn new(bus: Arc<dyn EventBus>, logger: &dyn LoggingPort) -> Self {
        Self {
            bus,
            logger: logger.with_context("EventHandlerRegistry"),
            registrations: Mutex::new(Vec::new()),
        }
    }

    fn registrations(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes `handler` to its event type.
    ///
    /// Returns false, and leaves the bus untouched, if a handler for that
    /// event type is already registered.
    pub fn register(&self, handler: Arc<dyn EventHandler>) -> bool {
        let event_type = handler.event_type();
        let mut registrations = self.registrations();

        if registrations
            .iter()
            .any(|r| r.info.event_type == event_type)
        {
            self.logger.warn(
                "Handler already registered for event type",
                json!({ "eventType": event_type, "handlerName": handler.name() }),
            );
            return false;
        }

        let info = HandlerInfo {
            event_type: event_type.to_string(),
            handler_name: handler.name().to_string(),
        };
        let logged = Arc::new(LoggedHandler {
            inner: handler,
            logger: Arc::clone(&self.logger),
        });
        let subscription = self.bus.subscribe(event_type, logged);

        self.logger.info(
            "Handler registered",
            json!({ "eventType": info.event_type, "handlerName": info.handler_name }),
        );
        registrations.push(Registration { info, subscription });
        true
    }

    /// Registers every handler and returns how many were accepted.
    pub fn register_all(&self, handlers: Vec<Arc<dyn EventHandler>>) -> usize {
        let total = handlers.len();
        let accepted = handlers.into_iter().filter(|h| self.register(Arc::clone(h))).count();
        self.logger.info(
            "Event handlers registered",
            json!({ "accepted": accepted, "total": total, "eventTypes": self.registered_event_types() }),
        );
        accepted
    }

    pub fn registered_event_types(&self) -> Vec<String> {
        self.registrations()
            .iter()
            .map(|r| r.info.event_type.clone())
            .collect()
    }

    pub fn has_handler(&self, event_type: &str) -> bool {
        self.registrations()
            .iter()
            .any(|r| r.info.event_type == event_type)
    }

    pub fn handler_info(&self) -> Vec<HandlerInfo> {
        self.registrations()
            .iter()
            .map(|r| r.info.clone())
            .collect()
    }

    /// Unsubscribes every registered handler from the bus.
    pub fn unregister_all(&self) {
        let drained: Vec<Registration> = self.registrations().drain(..).collect();
        let count = drained.len();
        for registration in drained {
            registration.subscription.unsubscribe();
        }
        self.logger
            .info("Event handlers unregistered", json!({ "count": count }));
    }
}

struct LoggedHandler {
    inner: Arc<dyn EventHandler>,
    logger: Arc<dyn LoggingPort>,
}

#[async_trait]
impl EventHandler for LoggedHandler {
    fn event_type(&self) -> &'static str {
        self.inner.event_type()
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let name = self.inner.name();
        self.logger.info(
            "Running handler",
            json!({ "eventType": event.event_type(), "aggregateId": event.aggregate_id, "handlerName": name }),
        );

        match self.inner.handle(event).await {
            Ok(()) => {
                self.logger
                    .info("Handler completed", json!({ "handlerName": name }));
                Ok(())
            }
            Err(err) => {
                self.logger.error(
                    "Handler failed",
                    json!({
                        "handlerName": name,
                        "eventType": event.event_type(),
                        "error": err.to_string(),
                    }),
                );
                Err(err)
            }
        }
    }
}
