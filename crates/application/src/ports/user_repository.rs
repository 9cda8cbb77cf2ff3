//! User persistence port and the error type shared by all repositories.

use async_trait::async_trait;
use common::{Page, PageRequest};
use domain::{DomainError, Email, User, UserId};
use thiserror::Error;

/// Errors returned by repository adapters.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The write clashes with existing data (e.g. a duplicate email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The record the operation targets does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The remote backend could not be reached or answered unexpectedly.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored record no longer satisfies the domain rules.
    #[error("Corrupted record: {0}")]
    Corrupted(#[from] DomainError),

    /// An atomic change was refused by a business rule; nothing was written.
    #[error(transparent)]
    Rejected(DomainError),
}

impl RepositoryError {
    pub fn code(&self) -> &'static str {
        match self {
            RepositoryError::Conflict(_) => "CONFLICT",
            RepositoryError::NotFound(_) => "NOT_FOUND",
            RepositoryError::Storage(_) => "STORAGE_ERROR",
            RepositoryError::Transport(_) => "TRANSPORT_ERROR",
            RepositoryError::Serialization(_) => "SERIALIZATION_ERROR",
            RepositoryError::Corrupted(_) => "CORRUPTED_RECORD",
            RepositoryError::Rejected(e) => e.code(),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Persistence for users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns the user with the given id, if any.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Returns the user owning the given email, if any.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Returns one page of users.
    async fn find_all(&self, page: PageRequest) -> Result<Page<User>, RepositoryError>;

    /// Inserts or replaces a user and returns it as stored.
    ///
    /// The stored user may differ from the argument: a remote backend
    /// assigns its own id to a user it has not seen. Saving over a deleted
    /// user fails with [`RepositoryError::NotFound`].
    async fn save(&self, user: &User) -> Result<User, RepositoryError>;

    /// Activates a pending user in one step and returns it.
    ///
    /// Fails with [`RepositoryError::Rejected`] when the user is not pending.
    async fn activate(&self, id: &UserId) -> Result<User, RepositoryError>;

    /// Suspends a user in one step and returns it.
    async fn suspend(&self, id: &UserId) -> Result<User, RepositoryError>;

    /// Deletes a user. Returns false if it did not exist.
    async fn delete_by_id(&self, id: &UserId) -> Result<bool, RepositoryError>;

    /// Returns true if some user owns the given email.
    async fn exists_by_email(&self, email: &Email) -> Result<bool, RepositoryError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    /// Number of users.
    async fn count(&self) -> Result<u64, RepositoryError>;
}
