//! Application error types.

use domain::{DomainError, ProductError, UserError, ValueError};
use thiserror::Error;

use crate::ports::{EventBusError, RepositoryError};

/// Errors returned by use cases.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A business rule was violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The repository failed.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    /// The event could not be published.
    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    /// Input was rejected before reaching the domain.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ApplicationError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ApplicationError::Domain(e) => e.code(),
            ApplicationError::Repository(e) => e.code(),
            ApplicationError::EventBus(_) => "EVENT_BUS_ERROR",
            ApplicationError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

// A rule rejected inside the repository is reported like any other rule.
impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Rejected(e) => ApplicationError::Domain(e),
            other => ApplicationError::Repository(other),
        }
    }
}

impl From<UserError> for ApplicationError {
    fn from(err: UserError) -> Self {
        ApplicationError::Domain(err.into())
    }
}

impl From<ProductError> for ApplicationError {
    fn from(err: ProductError) -> Self {
        ApplicationError::Domain(err.into())
    }
}

impl From<ValueError> for ApplicationError {
    fn from(err: ValueError) -> Self {
        ApplicationError::Domain(err.into())
    }
}

/// Convenience type alias for use case results.
pub type Result<T> = std::result::Result<T, ApplicationError>;
