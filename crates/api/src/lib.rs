//! REST server for the catalog service.
//!
//! Exposes the user and product use cases over HTTP, together with mock
//! authentication, a health check and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod seed;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::{ApiError, StartupError};
pub use state::{AppState, Dependencies, build_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/users", get(routes::users::list).post(routes::users::create))
        .route(
            "/api/users/{id}",
            get(routes::users::get)
                .put(routes::users::update)
                .delete(routes::users::delete),
        )
        .route("/api/users/{id}/activate", patch(routes::users::activate))
        .route("/api/users/{id}/suspend", post(routes::users::suspend))
        .route(
            "/api/products",
            get(routes::products::list).post(routes::products::create),
        )
        .route("/api/products/search", get(routes::products::search))
        .route(
            "/api/products/{id}",
            get(routes::products::get)
                .put(routes::products::update)
                .delete(routes::products::delete),
        )
        .route("/api/products/{id}/stock", put(routes::products::update_stock))
        .route("/api/products/{id}/reserve", post(routes::products::reserve))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/refresh", post(routes::auth::refresh))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
