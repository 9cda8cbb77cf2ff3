//! Domain error types.

use thiserror::Error;

use crate::product::ProductError;
use crate::user::UserError;
use crate::value_objects::ValueError;

/// Any error raised by the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A value object rejected its input.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// A user rule was violated.
    #[error(transparent)]
    User(#[from] UserError),

    /// A product rule was violated.
    #[error(transparent)]
    Product(#[from] ProductError),
}

impl DomainError {
    /// Stable machine-readable code, e.g. `USER_NOT_FOUND`.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Value(e) => e.code(),
            DomainError::User(e) => e.code(),
            DomainError::Product(e) => e.code(),
        }
    }
}
