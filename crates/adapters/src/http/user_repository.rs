//! User repository backed by the `users` REST resource.

use application::dto::UserDto;
use application::ports::{RepositoryError, UserRepository};
use async_trait::async_trait;
use common::{Page, PageRequest};
use domain::{DomainError, Email, User, UserError, UserId, UserStatus};
use serde::Serialize;
use serde_json::json;

use super::ApiClient;

const ENDPOINT: &str = "users";

#[derive(Debug, Serialize)]
struct UserPayload<'a> {
    email: &'a str,
    name: &'a str,
}

/// Rebuilds a user from its wire form.
pub(crate) fn user_from_dto(dto: UserDto) -> Result<User, RepositoryError> {
    let id = UserId::parse(dto.id).map_err(DomainError::from)?;
    let email = Email::parse(&dto.email).map_err(DomainError::from)?;
    let status: UserStatus = dto.status.parse().map_err(DomainError::from)?;
    Ok(User::restore(
        id,
        email,
        dto.name,
        status,
        dto.created_at,
        dto.updated_at,
    ))
}

/// [`UserRepository`] over a remote REST API.
///
/// `save` updates through `PUT users/{id}` when the user exists and creates
/// through `POST users` otherwise; the remote side assigns ids to created
/// users, so callers must use the returned user. Status changes go through
/// `PATCH users/{id}/activate` and `POST users/{id}/suspend`, where the
/// backend applies the transition.
#[derive(Debug, Clone)]
pub struct HttpUserRepository {
    client: ApiClient,
}

impl HttpUserRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn path(id: &UserId) -> String {
        format!("{ENDPOINT}/{id}")
    }

    async fn list(&self, query: &[(&str, String)]) -> Result<Page<User>, RepositoryError> {
        let response = self.client.get_paginated::<UserDto>(ENDPOINT, query).await?;
        response.into_page().try_map(user_from_dto)
    }

    async fn require(&self, id: &UserId) -> Result<User, RepositoryError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))
    }

    /// Brings the remote status of `stored` to `wanted`.
    async fn sync_status(&self, stored: User, wanted: UserStatus) -> Result<User, RepositoryError> {
        match (stored.status(), wanted) {
            (current, wanted) if current == wanted => Ok(stored),
            (_, UserStatus::Active) => self.activate(stored.id()).await,
            (_, UserStatus::Suspended) => self.suspend(stored.id()).await,
            (current, UserStatus::Pending) => Err(RepositoryError::Rejected(
                UserError::InvalidStatusTransition {
                    current,
                    action: "reset",
                }
                .into(),
            )),
        }
    }
}

fn page_query(page: PageRequest) -> Vec<(&'static str, String)> {
    vec![
        ("limit", page.limit.to_string()),
        ("offset", page.offset.to_string()),
    ]
}

#[async_trait]
impl UserRepository for HttpUserRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        match self.client.get::<UserDto>(&Self::path(id), &[]).await {
            Ok(dto) => user_from_dto(dto).map(Some),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let query = [
            ("email", email.to_string()),
            ("limit", "1".to_string()),
        ];
        let page = self.list(&query).await?;
        Ok(page.items.into_iter().next())
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<User>, RepositoryError> {
        self.list(&page_query(page)).await
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.id()))]
    async fn save(&self, user: &User) -> Result<User, RepositoryError> {
        let payload = UserPayload {
            email: user.email().as_str(),
            name: user.name(),
        };
        let dto = if self.find_by_id(user.id()).await?.is_some() {
            self.client
                .put::<_, UserDto>(&Self::path(user.id()), &payload)
                .await?
        } else {
            self.client.post::<_, UserDto>(ENDPOINT, &payload).await?
        };
        let stored = user_from_dto(dto)?;
        self.sync_status(stored, user.status()).await
    }

    #[tracing::instrument(skip(self))]
    async fn activate(&self, id: &UserId) -> Result<User, RepositoryError> {
        let mut current = self.require(id).await?;
        let before = current.status();
        current
            .activate()
            .map_err(|e| RepositoryError::Rejected(e.into()))?;

        let path = format!("{}/activate", Self::path(id));
        match self.client.patch::<_, UserDto>(&path, &json!({})).await {
            Ok(dto) => user_from_dto(dto),
            Err(err) if err.is_conflict() => Err(RepositoryError::Rejected(
                UserError::InvalidStatusTransition {
                    current: before,
                    action: "activate",
                }
                .into(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn suspend(&self, id: &UserId) -> Result<User, RepositoryError> {
        let path = format!("{}/suspend", Self::path(id));
        let dto = self.client.post::<_, UserDto>(&path, &json!({})).await?;
        user_from_dto(dto)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: &UserId) -> Result<bool, RepositoryError> {
        match self.client.delete(&Self::path(id)).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let response = self
            .client
            .get_paginated::<UserDto>(ENDPOINT, &page_query(PageRequest::new(1, 0)))
            .await?;
        Ok(response.pagination.total)
    }
}
