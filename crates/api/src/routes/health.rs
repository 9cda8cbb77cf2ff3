//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub event_bus: &'static str,
    pub handlers: usize,
    pub timestamp: DateTime<Utc>,
}

/// GET /health: returns system health status.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let bus_open = !state.bus.is_closed();
    Json(HealthResponse {
        status: if bus_open { "ok" } else { "degraded" },
        event_bus: if bus_open { "open" } else { "closed" },
        handlers: state.registry.handler_info().len(),
        timestamp: Utc::now(),
    })
}
