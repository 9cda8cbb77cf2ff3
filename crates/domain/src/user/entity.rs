//! The user entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{UserError, UserStatus};
use crate::value_objects::{Email, UserId};

/// A registered user of the platform.
///
/// Identity is the [`UserId`]; two users are equal when their ids match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    email: Email,
    name: String,
    status: UserStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Registers a new user in [`UserStatus::Pending`].
    pub fn register(id: UserId, email: Email, name: &str) -> Result<Self, UserError> {
        let name = validate_name(name)?;
        let now = Utc::now();
        Ok(Self {
            id,
            email,
            name,
            status: UserStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a user from persisted data.
    pub fn restore(
        id: UserId,
        email: Email,
        name: impl Into<String>,
        status: UserStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name: name.into(),
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the account is active.
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Activates a pending account.
    ///
    /// Fails without changing anything when the user is already active or suspended.
    pub fn activate(&mut self) -> Result<(), UserError> {
        if !self.status.can_activate() {
            return Err(UserError::InvalidStatusTransition {
                current: self.status,
                action: "activate",
            });
        }
        self.status = UserStatus::Active;
        self.touch();
        Ok(())
    }

    /// Suspends the account from any status.
    pub fn suspend(&mut self) {
        if self.status != UserStatus::Suspended {
            self.status = UserStatus::Suspended;
            self.touch();
        }
    }

    /// Changes the display name.
    pub fn rename(&mut self, name: &str) -> Result<(), UserError> {
        self.name = validate_name(name)?;
        self.touch();
        Ok(())
    }

    /// Changes the email address.
    pub fn change_email(&mut self, email: Email) {
        if self.email != email {
            self.email = email;
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

fn validate_name(name: &str) -> Result<String, UserError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(UserError::InvalidData("name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
