use std::sync::Arc;

use async_trait::async_trait;
use domain::{DomainEvent, EventPayload, event_types};
use serde_json::json;

use crate::ports::{
    EventHandler, HandlerError, LoggingPort, NotificationChannel, NotificationData,
    NotificationPort,
};

/// Tells the administrators about new users with an institutional email.
pub struct UserCreatedHandler {
    notifier: Arc<dyn NotificationPort>,
    logger: Arc<dyn LoggingPort>,
    admin_recipient: String,
    institutional_domain: String,
}

impl UserCreatedHandler {
    pub fn new(
        notifier: Arc<dyn NotificationPort>,
        logger: &dyn LoggingPort,
        admin_recipient: impl Into<String>,
        institutional_domain: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            logger: logger.with_context("UserCreatedHandler"),
            admin_recipient: admin_recipient.into(),
            institutional_domain: institutional_domain.into(),
        }
    }
}

#[async_trait]
impl EventHandler for UserCreatedHandler {
    fn event_type(&self) -> &'static str {
        event_types::USER_CREATED
    }

    fn name(&self) -> &'static str {
        "UserCreatedHandler"
    }

    #[tracing::instrument(skip_all, fields(aggregate_id = %event.aggregate_id))]
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let EventPayload::UserCreated(data) = &event.payload else {
            return Err(HandlerError::UnexpectedEvent(event.event_type().to_string()));
        };

        self.logger.info(
            "Processing new user",
            json!({
                "userId": data.user_id.as_str(),
                "email": data.email.as_str(),
                "occurredOn": event.occurred_on,
            }),
        );

        if data.email.domain() == self.institutional_domain {
            let notice = NotificationData::new(
                NotificationChannel::System,
                self.admin_recipient.as_str(),
                "New institutional user registered",
                format!(
                    "A new user registered with an institutional email: {}",
                    data.email
                ),
            )
            .with_metadata("userId", data.user_id.as_str())
            .with_metadata("userType", "institutional");
            self.notifier.send(notice).await?;

            self.logger.info(
                "Administrators notified about institutional user",
                json!({ "email": data.email.as_str() }),
            );
        }

        Ok(())
    }
}
