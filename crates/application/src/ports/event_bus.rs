//! Event bus port and the handler contract.

use std::sync::Arc;

use async_trait::async_trait;
use domain::DomainEvent;
use thiserror::Error;

use super::{NotificationError, RepositoryError};

/// Errors returned by the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventBusError {
    /// The bus has been shut down.
    #[error("Event bus is closed")]
    Closed,
}

/// Errors a handler may report back to the bus.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Notification failed: {0}")]
    Notification(#[from] NotificationError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The handler received an event it does not understand.
    #[error("Unexpected event: {0}")]
    UnexpectedEvent(String),
}

/// Reacts to one type of domain event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// The event type key this handler is meant for, e.g. `USER_CREATED`.
    fn event_type(&self) -> &'static str;

    /// Human-readable handler name used in logs.
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError>;
}

/// Process-local publish/subscribe.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Delivers `event` to the current subscribers of its type.
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError>;

    /// Registers `handler` for events of `event_type`.
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) -> Subscription;

    /// Publishes events one after another, in order.
    async fn publish_batch(&self, events: Vec<DomainEvent>) -> Result<(), EventBusError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping it keeps the subscription alive; call [`Subscription::unsubscribe`]
/// to remove the handler.
pub struct Subscription {
    event_type: String,
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(event_type: impl Into<String>, cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            event_type: event_type.into(),
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that was never registered, e.g. on a closed bus.
    pub fn inert(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            cancel: None,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Removes exactly this handler from the bus.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &self.event_type)
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_unsubscribe_runs_cancel_once() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let sub = Subscription::new("USER_CREATED", move || flag.store(true, Ordering::SeqCst));
        assert_eq!(sub.event_type(), "USER_CREATED");
        sub.unsubscribe();
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_dropping_does_not_cancel() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let sub = Subscription::new("USER_CREATED", move || flag.store(true, Ordering::SeqCst));
        drop(sub);
        assert!(!called.load(Ordering::SeqCst));
    }
}
