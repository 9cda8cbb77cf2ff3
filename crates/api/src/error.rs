//! API error types with HTTP response mapping.

use adapters::http::ErrorBody;
use adapters::storage::StorageError;
use application::ApplicationError;
use application::ports::RepositoryError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ProductError, UserError};
use thiserror::Error;

use crate::auth::AuthError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A use case failed.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Application(err) => application_status(err),
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Application(err) => err.code(),
            ApiError::Auth(err) => err.code(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

fn application_status(err: &ApplicationError) -> StatusCode {
    match err {
        ApplicationError::Domain(err) => domain_status(err),
        ApplicationError::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
        ApplicationError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
        ApplicationError::Validation(_) => StatusCode::BAD_REQUEST,
        ApplicationError::Repository(_) | ApplicationError::EventBus(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::User(UserError::NotFound { .. })
        | DomainError::Product(ProductError::NotFound { .. }) => StatusCode::NOT_FOUND,
        DomainError::User(UserError::AlreadyExists { .. })
        | DomainError::User(UserError::InvalidStatusTransition { .. })
        | DomainError::Product(ProductError::NotAvailable { .. }) => StatusCode::CONFLICT,
        DomainError::Value(_)
        | DomainError::User(UserError::InvalidData(_))
        | DomainError::Product(ProductError::InvalidData(_))
        | DomainError::Product(ProductError::InvalidQuantity { .. }) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::debug!(error = %self, code, "request rejected");
        }
        metrics::counter!("api_errors", "code" => code).increment(1);

        let body = ErrorBody {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.to_string(),
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Failures while assembling the application state.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open storage: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to seed demo data: {0}")]
    Seed(#[from] RepositoryError),
}
