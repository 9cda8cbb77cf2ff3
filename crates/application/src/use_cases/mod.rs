//! Use cases: one struct per application operation.
//!
//! Every use case follows the same shape: validate input, load the entity,
//! apply one domain operation, persist, publish one event, kick off any
//! notification in the background, and return a DTO.

pub mod product;
pub mod user;

pub use product::{
    CreateProduct, DeleteProduct, GetProductById, GetProducts, ReserveProductStock,
    UpdateProduct, UpdateProductStock,
};
pub use user::{
    ActivateUser, CreateUser, DeleteUser, GetUserById, GetUsers, SuspendUser, UpdateUser,
};

use std::future::Future;
use std::sync::Arc;

use serde_json::json;

use crate::error::ApplicationError;
use crate::ports::{LoggingPort, NotificationError};

/// Runs a notification in the background.
///
/// The caller does not wait for delivery; a failure is logged and counted.
pub(crate) fn spawn_notification<F>(logger: Arc<dyn LoggingPort>, kind: &'static str, fut: F)
where
    F: Future<Output = Result<(), NotificationError>> + Send + 'static,
{
    tokio::spawn(async move {
        match fut.await {
            Ok(()) => {
                metrics::counter!("notifications_sent", "kind" => kind).increment(1);
            }
            Err(err) => {
                metrics::counter!("notifications_failed", "kind" => kind).increment(1);
                logger.error(
                    "Failed to send notification",
                    json!({ "kind": kind, "error": err.to_string() }),
                );
            }
        }
    });
}

/// Logs a failed execution: rejections at warn, everything else at error.
fn log_failure(logger: &dyn LoggingPort, message: &str, err: &ApplicationError) {
    let fields = json!({ "code": err.code(), "error": err.to_string() });
    match err {
        ApplicationError::Domain(_) | ApplicationError::Validation(_) => {
            logger.warn(message, fields)
        }
        _ => logger.error(message, fields),
    }
}

/// Counts one execution of a use case by outcome.
fn record_outcome<T>(use_case: &'static str, result: &Result<T, ApplicationError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(ApplicationError::Domain(_) | ApplicationError::Validation(_)) => "rejected",
        Err(_) => "failure",
    };
    metrics::counter!("use_case_executions", "use_case" => use_case, "outcome" => outcome)
        .increment(1);
}

/// Records the outcome of an execution and logs it if it failed.
pub(crate) fn conclude<T>(
    logger: &dyn LoggingPort,
    use_case: &'static str,
    failure_message: &str,
    result: Result<T, ApplicationError>,
) -> Result<T, ApplicationError> {
    record_outcome(use_case, &result);
    if let Err(err) = &result {
        log_failure(logger, failure_message, err);
    }
    result
}
