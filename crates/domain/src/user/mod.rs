//! User entity and related types.

mod entity;
mod status;

pub use entity::User;
pub use status::UserStatus;

use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    /// No user with the given id.
    #[error("User with id {id} not found")]
    NotFound { id: String },

    /// Another user already owns the email address.
    #[error("User with email {email} already exists")]
    AlreadyExists { email: String },

    /// User data failed validation.
    #[error("Invalid user data: {0}")]
    InvalidData(String),

    /// The requested status change is not allowed.
    #[error("Invalid status transition: cannot {action} a user in {current} status")]
    InvalidStatusTransition {
        current: UserStatus,
        action: &'static str,
    },
}

impl UserError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            UserError::NotFound { .. } => "USER_NOT_FOUND",
            UserError::AlreadyExists { .. } => "USER_ALREADY_EXISTS",
            UserError::InvalidData(_) => "INVALID_USER_DATA",
            UserError::InvalidStatusTransition { .. } => "INVALID_USER_STATUS_TRANSITION",
        }
    }
}
