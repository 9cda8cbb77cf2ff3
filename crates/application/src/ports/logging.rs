//! Structured logging port.

use std::sync::Arc;

use serde_json::Value;

/// Logger handed to use cases and event handlers.
///
/// `fields` is a JSON object of extra key/value pairs; pass `Value::Null`
/// when there is nothing to attach.
pub trait LoggingPort: Send + Sync {
    fn info(&self, message: &str, fields: Value);
    fn warn(&self, message: &str, fields: Value);
    fn error(&self, message: &str, fields: Value);
    fn debug(&self, message: &str, fields: Value);

    /// Returns a logger that tags every entry with `context`.
    fn with_context(&self, context: &str) -> Arc<dyn LoggingPort>;
}
