use std::sync::Arc;

use async_trait::async_trait;
use domain::{DomainEvent, EventPayload, event_types};
use serde_json::json;

use crate::ports::{
    EventHandler, HandlerError, LoggingPort, NotificationChannel, NotificationData,
    NotificationPort,
};

/// Confirms an activation to the user by email.
pub struct UserActivatedHandler {
    notifier: Arc<dyn NotificationPort>,
    logger: Arc<dyn LoggingPort>,
}

impl UserActivatedHandler {
    pub fn new(notifier: Arc<dyn NotificationPort>, logger: &dyn LoggingPort) -> Self {
        Self {
            notifier,
            logger: logger.with_context("UserActivatedHandler"),
        }
    }
}

#[async_trait]
impl EventHandler for UserActivatedHandler {
    fn event_type(&self) -> &'static str {
        event_types::USER_ACTIVATED
    }

    fn name(&self) -> &'static str {
        "UserActivatedHandler"
    }

    #[tracing::instrument(skip_all, fields(aggregate_id = %event.aggregate_id))]
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let EventPayload::UserActivated(data) = &event.payload else {
            return Err(HandlerError::UnexpectedEvent(event.event_type().to_string()));
        };

        self.logger.info(
            "Processing user activation",
            json!({
                "userId": data.user_id.as_str(),
                "activatedBy": data.activated_by,
                "reason": data.reason,
            }),
        );

        let confirmation = NotificationData::new(
            NotificationChannel::Email,
            data.email.as_str(),
            "Your account has been activated",
            format!(
                "Hello {}! Your account has been activated. You now have access to every feature.",
                data.name
            ),
        )
        .with_metadata("template", "user-activation-confirmation")
        .with_metadata("priority", "high");
        self.notifier.send(confirmation).await?;

        self.logger.info(
            "Activation processed",
            json!({ "userId": data.user_id.as_str(), "activatedBy": data.activated_by }),
        );
        Ok(())
    }
}
