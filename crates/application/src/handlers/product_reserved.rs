use std::sync::Arc;

use async_trait::async_trait;
use domain::{DomainEvent, EventPayload, event_types};
use serde_json::json;

use crate::ports::{
    EventHandler, HandlerError, LoggingPort, NotificationChannel, NotificationData,
    NotificationPort,
};

/// Pushes a reservation notice to the user and writes an audit entry.
pub struct ProductReservedHandler {
    notifier: Arc<dyn NotificationPort>,
    logger: Arc<dyn LoggingPort>,
}

impl ProductReservedHandler {
    pub fn new(notifier: Arc<dyn NotificationPort>, logger: &dyn LoggingPort) -> Self {
        Self {
            notifier,
            logger: logger.with_context("ProductReservedHandler"),
        }
    }
}

#[async_trait]
impl EventHandler for ProductReservedHandler {
    fn event_type(&self) -> &'static str {
        event_types::PRODUCT_RESERVED
    }

    fn name(&self) -> &'static str {
        "ProductReservedHandler"
    }

    #[tracing::instrument(skip_all, fields(aggregate_id = %event.aggregate_id))]
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let EventPayload::ProductReserved(data) = &event.payload else {
            return Err(HandlerError::UnexpectedEvent(event.event_type().to_string()));
        };

        let push = NotificationData::new(
            NotificationChannel::Push,
            data.user_id.as_str(),
            "Reservation confirmed",
            format!(
                "Your reservation of {} units of product {} has been confirmed.",
                data.quantity, data.product_id
            ),
        )
        .with_metadata("productId", data.product_id.as_str())
        .with_metadata("quantity", data.quantity)
        .with_metadata("type", "reservation-confirmed");
        self.notifier.send(push).await?;

        // Audit trail
        self.logger.info(
            "Reservation audited",
            json!({
                "action": event.event_type(),
                "reservationId": data.reservation_id,
                "productId": data.product_id.as_str(),
                "userId": data.user_id.as_str(),
                "quantity": data.quantity,
                "remainingStock": data.remaining_stock,
                "timestamp": event.occurred_on,
            }),
        );
        Ok(())
    }
}
