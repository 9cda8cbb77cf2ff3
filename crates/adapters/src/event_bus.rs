//! In-memory event bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use application::ports::{EventBus, EventBusError, EventHandler, Subscription};
use async_trait::async_trait;
use domain::DomainEvent;

struct Registration {
    id: u64,
    handler: Arc<dyn EventHandler>,
}

#[derive(Default)]
struct BusState {
    handlers: HashMap<String, Vec<Registration>>,
    closed: bool,
}

#[derive(Default)]
struct Shared {
    state: RwLock<BusState>,
    next_id: AtomicU64,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, BusState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BusState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, event_type: &str, id: u64) {
        let mut state = self.write();
        if let Some(handlers) = state.handlers.get_mut(event_type) {
            handlers.retain(|r| r.id != id);
            if handlers.is_empty() {
                state.handlers.remove(event_type);
            }
        }
    }
}

/// Process-local event bus.
///
/// Events are delivered to the handlers subscribed at publish time, one after
/// another. A failing handler is logged and counted but neither stops
/// delivery to the remaining handlers nor fails the publish. Nothing is
/// persisted and late subscribers see no past events.
///
/// Clones share the same subscriptions.
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    shared: Arc<Shared>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handlers per event type.
    pub fn active_subscriptions(&self) -> HashMap<String, usize> {
        self.shared
            .read()
            .handlers
            .iter()
            .map(|(event_type, handlers)| (event_type.clone(), handlers.len()))
            .collect()
    }

    /// Number of handlers subscribed to `event_type`.
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.shared
            .read()
            .handlers
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Removes every subscription. The bus stays open.
    pub fn clear_all_subscriptions(&self) {
        let removed: usize = {
            let mut state = self.shared.write();
            let count = state.handlers.values().map(Vec::len).sum();
            state.handlers.clear();
            count
        };
        tracing::debug!(removed, "Cleared all event subscriptions");
    }

    /// Shuts the bus down. Later publishes fail with [`EventBusError::Closed`]
    /// and later subscriptions are inert.
    pub fn close(&self) {
        let mut state = self.shared.write();
        state.handlers.clear();
        state.closed = true;
        tracing::info!("Event bus closed");
    }

    pub fn is_closed(&self) -> bool {
        self.shared.read().closed
    }

    fn handlers_for(&self, event_type: &str) -> Result<Vec<Arc<dyn EventHandler>>, EventBusError> {
        let state = self.shared.read();
        if state.closed {
            return Err(EventBusError::Closed);
        }
        Ok(state
            .handlers
            .get(event_type)
            .map(|handlers| handlers.iter().map(|r| Arc::clone(&r.handler)).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type(), aggregate_id = %event.aggregate_id))]
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        let event_type = event.event_type();
        let handlers = self.handlers_for(event_type)?;
        metrics::counter!("events_published", "event_type" => event_type).increment(1);

        if handlers.is_empty() {
            tracing::debug!("No subscribers for event");
            return Ok(());
        }

        for handler in handlers {
            match handler.handle(&event).await {
                Ok(()) => {
                    metrics::counter!("events_delivered", "event_type" => event_type).increment(1);
                }
                Err(err) => {
                    metrics::counter!(
                        "event_handler_errors",
                        "event_type" => event_type,
                        "handler" => handler.name()
                    )
                    .increment(1);
                    tracing::error!(handler = handler.name(), error = %err, "Event handler failed");
                }
            }
        }

        Ok(())
    }

    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) -> Subscription {
        let id = {
            let mut state = self.shared.write();
            if state.closed {
                tracing::warn!(event_type, handler = handler.name(), "Subscribe on closed event bus ignored");
                return Subscription::inert(event_type);
            }
            let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
            state
                .handlers
                .entry(event_type.to_string())
                .or_default()
                .push(Registration { id, handler });
            id
        };
        tracing::debug!(event_type, subscription_id = id, "Subscribed event handler");

        let shared = Arc::downgrade(&self.shared);
        let key = event_type.to_string();
        Subscription::new(event_type, move || {
            if let Some(shared) = shared.upgrade() {
                shared.remove(&key, id);
            }
        })
    }
}
