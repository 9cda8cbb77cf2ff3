//! User use cases.

use std::sync::Arc;

use common::Page;
use domain::{DomainEvent, Email, User, UserError, UserId};
use serde_json::json;

use super::{conclude, spawn_notification};
use crate::commands::{
    ActivateUserCommand, CreateUserCommand, DeleteUserCommand, GetUserByIdQuery, GetUsersQuery,
    SuspendUserCommand, UpdateUserCommand,
};
use crate::dto::{PaginatedUsersDto, UserDto};
use crate::error::{ApplicationError, Result};
use crate::ports::{EventBus, LoggingPort, NotificationPort, RepositoryError, UserRepository};

async fn find_user(users: &dyn UserRepository, id: &UserId) -> Result<User> {
    users
        .find_by_id(id)
        .await?
        .ok_or_else(|| UserError::NotFound { id: id.to_string() }.into())
}

// A storage-level conflict on save means another user took the email first.
fn conflict_as_duplicate(err: RepositoryError, email: &Email) -> ApplicationError {
    match err {
        RepositoryError::Conflict(_) => UserError::AlreadyExists {
            email: email.to_string(),
        }
        .into(),
        other => other.into(),
    }
}

// The user can vanish between the lookup and an atomic status change.
fn missing_as_not_found(err: RepositoryError, id: &UserId) -> ApplicationError {
    match err {
        RepositoryError::NotFound(_) => UserError::NotFound { id: id.to_string() }.into(),
        other => other.into(),
    }
}

/// Registers a new user and sends a welcome email.
pub struct CreateUser {
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn NotificationPort>,
    events: Arc<dyn EventBus>,
    logger: Arc<dyn LoggingPort>,
}

impl CreateUser {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn NotificationPort>,
        events: Arc<dyn EventBus>,
        logger: &dyn LoggingPort,
    ) -> Self {
        Self {
            users,
            notifier,
            events,
            logger: logger.with_context("CreateUser"),
        }
    }

    /// Fails with `USER_ALREADY_EXISTS` if the email is taken.
    #[tracing::instrument(skip(self, command))]
    pub async fn execute(&self, command: CreateUserCommand) -> Result<UserDto> {
        self.logger
            .info("Creating user", json!({ "email": command.email }));
        let result = self.run(command).await;
        conclude(self.logger.as_ref(), "create_user", "Failed to create user", result)
    }

    async fn run(&self, command: CreateUserCommand) -> Result<UserDto> {
        let email = Email::parse(&command.email)?;
        if self.users.exists_by_email(&email).await? {
            return Err(UserError::AlreadyExists {
                email: email.to_string(),
            }
            .into());
        }

        let user = User::register(UserId::generate(), email, &command.name)?;
        let user = self
            .users
            .save(&user)
            .await
            .map_err(|e| conflict_as_duplicate(e, user.email()))?;
        self.events.publish(DomainEvent::user_created(&user)).await?;

        let notifier = Arc::clone(&self.notifier);
        let recipient = user.clone();
        spawn_notification(Arc::clone(&self.logger), "welcome_email", async move {
            notifier.send_welcome_email(&recipient).await
        });

        self.logger.info(
            "User created",
            json!({ "userId": user.id().as_str(), "email": user.email().as_str() }),
        );
        Ok(UserDto::from(&user))
    }
}

pub struct GetUserById {
    users: Arc<dyn UserRepository>,
    logger: Arc<dyn LoggingPort>,
}

impl GetUserById {
    pub fn new(users: Arc<dyn UserRepository>, logger: &dyn LoggingPort) -> Self {
        Self {
            users,
            logger: logger.with_context("GetUserById"),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, query: GetUserByIdQuery) -> Result<UserDto> {
        let result = self.run(query).await;
        conclude(self.logger.as_ref(), "get_user_by_id", "Failed to get user", result)
    }

    async fn run(&self, query: GetUserByIdQuery) -> Result<UserDto> {
        self.logger
            .debug("Looking up user", json!({ "userId": query.user_id }));
        let id = UserId::parse(query.user_id)?;
        let user = find_user(self.users.as_ref(), &id).await?;
        Ok(UserDto::from(&user))
    }
}

/// Lists users one page at a time.
pub struct GetUsers {
    users: Arc<dyn UserRepository>,
    logger: Arc<dyn LoggingPort>,
}

impl GetUsers {
    pub fn new(users: Arc<dyn UserRepository>, logger: &dyn LoggingPort) -> Self {
        Self {
            users,
            logger: logger.with_context("GetUsers"),
        }
    }

    /// Out-of-range paging parameters are clamped, not rejected. An email
    /// filter yields at most one user.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, query: GetUsersQuery) -> Result<PaginatedUsersDto> {
        let result = self.run(query).await;
        conclude(self.logger.as_ref(), "get_users", "Failed to get users", result)
    }

    async fn run(&self, query: GetUsersQuery) -> Result<PaginatedUsersDto> {
        let page = query.page.clamped();
        let users = match query.email.as_deref() {
            Some(raw) => {
                let email = Email::parse(raw)?;
                let found = self.users.find_by_email(&email).await?;
                Page::from_vec(found.into_iter().collect(), page)
            }
            None => self.users.find_all(page).await?,
        };
        self.logger.debug(
            "Users retrieved",
            json!({ "count": users.len(), "total": users.total }),
        );
        Ok(PaginatedUsersDto {
            users: users.items.iter().map(UserDto::from).collect(),
            total: users.total,
            limit: page.limit,
            offset: page.offset,
            has_more: users.has_more,
        })
    }
}

/// Changes a user's name and/or email.
pub struct UpdateUser {
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventBus>,
    logger: Arc<dyn LoggingPort>,
}

impl UpdateUser {
    pub fn new(
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventBus>,
        logger: &dyn LoggingPort,
    ) -> Self {
        Self {
            users,
            events,
            logger: logger.with_context("UpdateUser"),
        }
    }

    /// A command that changes nothing is not saved and publishes no event.
    #[tracing::instrument(skip(self, command), fields(user_id = %command.user_id))]
    pub async fn execute(&self, command: UpdateUserCommand) -> Result<UserDto> {
        self.logger
            .info("Updating user", json!({ "userId": command.user_id }));
        let result = self.run(command).await;
        conclude(self.logger.as_ref(), "update_user", "Failed to update user", result)
    }

    async fn run(&self, command: UpdateUserCommand) -> Result<UserDto> {
        let id = UserId::parse(command.user_id)?;
        let mut user = find_user(self.users.as_ref(), &id).await?;
        let mut changed = Vec::new();

        if let Some(name) = command.name.as_deref() {
            if name.trim() != user.name() {
                user.rename(name)?;
                changed.push("name".to_string());
            }
        }

        if let Some(raw) = command.email.as_deref() {
            let email = Email::parse(raw)?;
            if &email != user.email() {
                if let Some(owner) = self.users.find_by_email(&email).await? {
                    if owner.id() != user.id() {
                        return Err(UserError::AlreadyExists {
                            email: email.to_string(),
                        }
                        .into());
                    }
                }
                user.change_email(email);
                changed.push("email".to_string());
            }
        }

        if changed.is_empty() {
            self.logger
                .debug("Nothing to update", json!({ "userId": id.as_str() }));
            return Ok(UserDto::from(&user));
        }

        let user = self
            .users
            .save(&user)
            .await
            .map_err(|e| conflict_as_duplicate(e, user.email()))?;
        self.events
            .publish(DomainEvent::user_updated(&user, changed.clone()))
            .await?;

        self.logger.info(
            "User updated",
            json!({ "userId": id.as_str(), "changedFields": changed }),
        );
        Ok(UserDto::from(&user))
    }
}

pub struct DeleteUser {
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventBus>,
    logger: Arc<dyn LoggingPort>,
}

impl DeleteUser {
    pub fn new(
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventBus>,
        logger: &dyn LoggingPort,
    ) -> Self {
        Self {
            users,
            events,
            logger: logger.with_context("DeleteUser"),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, command: DeleteUserCommand) -> Result<()> {
        self.logger
            .info("Deleting user", json!({ "userId": command.user_id }));
        let result = self.run(command).await;
        conclude(self.logger.as_ref(), "delete_user", "Failed to delete user", result)
    }

    async fn run(&self, command: DeleteUserCommand) -> Result<()> {
        let id = UserId::parse(command.user_id)?;
        let user = find_user(self.users.as_ref(), &id).await?;

        if !self.users.delete_by_id(&id).await? {
            return Err(RepositoryError::Storage(format!("failed to delete user {id}")).into());
        }
        self.events.publish(DomainEvent::user_deleted(&user)).await?;

        self.logger
            .info("User deleted", json!({ "userId": id.as_str() }));
        Ok(())
    }
}

/// Moves a pending user to active.
pub struct ActivateUser {
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventBus>,
    logger: Arc<dyn LoggingPort>,
}

impl ActivateUser {
    pub fn new(
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventBus>,
        logger: &dyn LoggingPort,
    ) -> Self {
        Self {
            users,
            events,
            logger: logger.with_context("ActivateUser"),
        }
    }

    /// Fails with `INVALID_USER_STATUS_TRANSITION` unless the user is pending.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, command: ActivateUserCommand) -> Result<UserDto> {
        self.logger.info(
            "Starting user activation",
            json!({ "userId": command.user_id, "activatedBy": command.activated_by }),
        );
        let result = self.run(command).await;
        conclude(self.logger.as_ref(), "activate_user", "Failed to activate user", result)
    }

    async fn run(&self, command: ActivateUserCommand) -> Result<UserDto> {
        let activated_by = command.activated_by.trim();
        if activated_by.is_empty() {
            return Err(ApplicationError::Validation(
                "activatedBy is required".to_string(),
            ));
        }

        let id = UserId::parse(command.user_id.as_str())?;
        let current = find_user(self.users.as_ref(), &id).await?;
        self.logger.debug(
            "User found for activation",
            json!({ "userId": id.as_str(), "currentStatus": current.status().as_str() }),
        );

        let user = self
            .users
            .activate(&id)
            .await
            .map_err(|e| missing_as_not_found(e, &id))?;
        self.events
            .publish(DomainEvent::user_activated(
                &user,
                activated_by,
                command.reason.clone(),
            ))
            .await?;

        self.logger.info(
            "User activated",
            json!({ "userId": id.as_str(), "newStatus": user.status().as_str() }),
        );
        Ok(UserDto::from(&user))
    }
}

pub struct SuspendUser {
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventBus>,
    logger: Arc<dyn LoggingPort>,
}

impl SuspendUser {
    pub fn new(
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventBus>,
        logger: &dyn LoggingPort,
    ) -> Self {
        Self {
            users,
            events,
            logger: logger.with_context("SuspendUser"),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, command: SuspendUserCommand) -> Result<UserDto> {
        self.logger
            .info("Suspending user", json!({ "userId": command.user_id }));
        let result = self.run(command).await;
        conclude(self.logger.as_ref(), "suspend_user", "Failed to suspend user", result)
    }

    async fn run(&self, command: SuspendUserCommand) -> Result<UserDto> {
        let id = UserId::parse(command.user_id)?;
        find_user(self.users.as_ref(), &id).await?;

        let user = self
            .users
            .suspend(&id)
            .await
            .map_err(|e| missing_as_not_found(e, &id))?;
        self.events
            .publish(DomainEvent::user_suspended(&user, command.reason))
            .await?;

        self.logger
            .info("User suspended", json!({ "userId": id.as_str() }));
        Ok(UserDto::from(&user))
    }
}
