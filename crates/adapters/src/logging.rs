//! Logging port backed by `tracing`.

use std::sync::Arc;

use application::ports::LoggingPort;
use serde_json::Value;

/// Emits every log entry as a `tracing` event.
///
/// The context, if any, goes into a `context` field and the JSON fields are
/// rendered into a `fields` field, so both the plain and the JSON
/// subscriber formats keep them.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    context: Option<String>,
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A logger whose entries are tagged with `context`.
    pub fn named(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
        }
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

/// Renders log fields; `null` and empty objects render as an empty string.
fn render_fields(fields: &Value) -> String {
    match fields {
        Value::Null => String::new(),
        Value::Object(map) if map.is_empty() => String::new(),
        other => other.to_string(),
    }
}

impl LoggingPort for TracingLogger {
    fn info(&self, message: &str, fields: Value) {
        tracing::info!(
            context = self.context().unwrap_or_default(),
            fields = %render_fields(&fields),
            "{message}"
        );
    }

    fn warn(&self, message: &str, fields: Value) {
        tracing::warn!(
            context = self.context().unwrap_or_default(),
            fields = %render_fields(&fields),
            "{message}"
        );
    }

    fn error(&self, message: &str, fields: Value) {
        tracing::error!(
            context = self.context().unwrap_or_default(),
            fields = %render_fields(&fields),
            "{message}"
        );
    }

    fn debug(&self, message: &str, fields: Value) {
        tracing::debug!(
            context = self.context().unwrap_or_default(),
            fields = %render_fields(&fields),
            "{message}"
        );
    }

    fn with_context(&self, context: &str) -> Arc<dyn LoggingPort> {
        Arc::new(Self::named(context))
    }
}
