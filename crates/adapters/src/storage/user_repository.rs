//! User repository over [`JsonStore`].

use application::ports::{RepositoryError, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Page, PageRequest};
use domain::{DomainError, Email, User, UserError, UserId, UserStatus};
use serde::{Deserialize, Serialize};

use super::JsonStore;

const USERS_KEY: &str = "users";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: String,
    email: String,
    name: String,
    status: UserStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deleted_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
            name: user.name().to_string(),
            status: user.status(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
            deleted_at: None,
        }
    }

    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    fn to_user(&self) -> Result<User, RepositoryError> {
        let id = UserId::parse(self.id.as_str()).map_err(DomainError::from)?;
        let email = Email::parse(&self.email).map_err(DomainError::from)?;
        Ok(User::restore(
            id,
            email,
            self.name.as_str(),
            self.status,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// [`UserRepository`] that keeps users as a JSON array under the `users` key.
///
/// Deleting marks the record with `deletedAt`; deleted users are invisible
/// to every finder and to `count`, and their email can be reused. A deleted
/// user cannot be saved again.
#[derive(Debug, Clone)]
pub struct StorageUserRepository {
    store: JsonStore,
}

impl StorageUserRepository {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    async fn live_records(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        let records: Vec<UserRecord> = self.store.get_item(USERS_KEY).await?.unwrap_or_default();
        Ok(records.into_iter().filter(UserRecord::is_live).collect())
    }

    /// Applies `change` to a live user and stores the result under one lock.
    async fn modify(
        &self,
        id: &UserId,
        change: impl FnOnce(&mut User) -> Result<(), UserError>,
    ) -> Result<User, RepositoryError> {
        self.store
            .update_item(USERS_KEY, |records: &mut Vec<UserRecord>| {
                let record = records
                    .iter_mut()
                    .find(|r| r.is_live() && r.id == id.as_str())
                    .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))?;
                let mut user = record.to_user()?;
                change(&mut user).map_err(|e| RepositoryError::Rejected(e.into()))?;
                *record = UserRecord::from_user(&user);
                Ok::<_, RepositoryError>(user)
            })
            .await
    }
}

#[async_trait]
impl UserRepository for StorageUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        self.live_records()
            .await?
            .iter()
            .find(|r| r.id == id.as_str())
            .map(UserRecord::to_user)
            .transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        self.live_records()
            .await?
            .iter()
            .find(|r| r.email.eq_ignore_ascii_case(email.as_str()))
            .map(UserRecord::to_user)
            .transpose()
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<User>, RepositoryError> {
        Page::from_vec(self.live_records().await?, page).try_map(|r| r.to_user())
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.id()))]
    async fn save(&self, user: &User) -> Result<User, RepositoryError> {
        let record = UserRecord::from_user(user);
        let stored = self
            .store
            .update_item(USERS_KEY, |records: &mut Vec<UserRecord>| {
                let taken = records.iter().any(|r| {
                    r.is_live() && r.id != record.id && r.email.eq_ignore_ascii_case(&record.email)
                });
                if taken {
                    return Err(RepositoryError::Conflict(format!(
                        "email {} is already in use",
                        record.email
                    )));
                }
                match records.iter().position(|r| r.is_live() && r.id == record.id) {
                    Some(i) => records[i] = record.clone(),
                    None if records.iter().any(|r| r.id == record.id) => {
                        return Err(RepositoryError::NotFound(format!(
                            "user {} was deleted",
                            record.id
                        )));
                    }
                    None => records.push(record.clone()),
                }
                Ok(record)
            })
            .await?;
        stored.to_user()
    }

    #[tracing::instrument(skip(self))]
    async fn activate(&self, id: &UserId) -> Result<User, RepositoryError> {
        self.modify(id, User::activate).await
    }

    #[tracing::instrument(skip(self))]
    async fn suspend(&self, id: &UserId) -> Result<User, RepositoryError> {
        self.modify(id, |user| {
            user.suspend();
            Ok(())
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: &UserId) -> Result<bool, RepositoryError> {
        self.store
            .update_item(USERS_KEY, |records: &mut Vec<UserRecord>| {
                let found = records
                    .iter_mut()
                    .find(|r| r.is_live() && r.id == id.as_str());
                Ok::<_, RepositoryError>(match found {
                    Some(record) => {
                        record.deleted_at = Some(Utc::now());
                        true
                    }
                    None => false,
                })
            })
            .await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.live_records().await?.len() as u64)
    }
}
