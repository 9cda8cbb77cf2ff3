//! Domain events published by the application layer.
//!
//! Events are plain immutable records. They are delivered through the
//! event bus and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::user::User;
use crate::value_objects::{Email, Money, ProductId, UserId};

/// Something that happened to a user or a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    /// Id of the entity the event is about.
    pub aggregate_id: String,

    /// When the event was raised.
    pub occurred_on: DateTime<Utc>,

    /// Type-specific data.
    pub payload: EventPayload,
}

impl DomainEvent {
    /// Wraps a payload with the current time.
    pub fn new(aggregate_id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            occurred_on: Utc::now(),
            payload,
        }
    }

    /// Returns the event type key used for subscriptions, e.g. `USER_CREATED`.
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    pub fn user_created(user: &User) -> Self {
        Self::new(
            user.id().as_str(),
            EventPayload::UserCreated(UserCreatedData {
                user_id: user.id().clone(),
                email: user.email().clone(),
                name: user.name().to_string(),
            }),
        )
    }

    pub fn user_updated(user: &User, changed_fields: Vec<String>) -> Self {
        Self::new(
            user.id().as_str(),
            EventPayload::UserUpdated(UserUpdatedData {
                user_id: user.id().clone(),
                email: user.email().clone(),
                name: user.name().to_string(),
                changed_fields,
            }),
        )
    }

    pub fn user_activated(user: &User, activated_by: &str, reason: Option<String>) -> Self {
        Self::new(
            user.id().as_str(),
            EventPayload::UserActivated(UserActivatedData {
                user_id: user.id().clone(),
                email: user.email().clone(),
                name: user.name().to_string(),
                activated_by: activated_by.to_string(),
                activated_at: user.updated_at(),
                reason,
            }),
        )
    }

    pub fn user_suspended(user: &User, reason: Option<String>) -> Self {
        Self::new(
            user.id().as_str(),
            EventPayload::UserSuspended(UserSuspendedData {
                user_id: user.id().clone(),
                email: user.email().clone(),
                suspended_at: user.updated_at(),
                reason,
            }),
        )
    }

    pub fn user_deleted(user: &User) -> Self {
        Self::new(
            user.id().as_str(),
            EventPayload::UserDeleted(UserDeletedData {
                user_id: user.id().clone(),
                email: user.email().clone(),
            }),
        )
    }

    pub fn product_created(product: &Product) -> Self {
        Self::new(
            product.id().as_str(),
            EventPayload::ProductCreated(ProductCreatedData {
                product_id: product.id().clone(),
                name: product.name().to_string(),
                price: product.price(),
                stock: product.stock(),
            }),
        )
    }

    pub fn product_reserved(
        product: &Product,
        user_id: &UserId,
        quantity: u32,
        reservation_id: &str,
    ) -> Self {
        Self::new(
            product.id().as_str(),
            EventPayload::ProductReserved(ProductReservedData {
                product_id: product.id().clone(),
                user_id: user_id.clone(),
                quantity,
                reservation_id: reservation_id.to_string(),
                remaining_stock: product.stock(),
            }),
        )
    }

    pub fn product_stock_updated(product: &Product, old_stock: u32) -> Self {
        Self::new(
            product.id().as_str(),
            EventPayload::ProductStockUpdated(ProductStockUpdatedData {
                product_id: product.id().clone(),
                old_stock,
                new_stock: product.stock(),
            }),
        )
    }
}

/// Event-specific data, tagged by event type on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    UserCreated(UserCreatedData),
    UserUpdated(UserUpdatedData),
    UserActivated(UserActivatedData),
    UserSuspended(UserSuspendedData),
    UserDeleted(UserDeletedData),
    ProductCreated(ProductCreatedData),
    ProductReserved(ProductReservedData),
    ProductStockUpdated(ProductStockUpdatedData),
}

impl EventPayload {
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::UserCreated(_) => event_types::USER_CREATED,
            EventPayload::UserUpdated(_) => event_types::USER_UPDATED,
            EventPayload::UserActivated(_) => event_types::USER_ACTIVATED,
            EventPayload::UserSuspended(_) => event_types::USER_SUSPENDED,
            EventPayload::UserDeleted(_) => event_types::USER_DELETED,
            EventPayload::ProductCreated(_) => event_types::PRODUCT_CREATED,
            EventPayload::ProductReserved(_) => event_types::PRODUCT_RESERVED,
            EventPayload::ProductStockUpdated(_) => event_types::PRODUCT_STOCK_UPDATED,
        }
    }
}

/// Event type keys.
pub mod event_types {
    pub const USER_CREATED: &str = "USER_CREATED";
    pub const USER_UPDATED: &str = "USER_UPDATED";
    pub const USER_ACTIVATED: &str = "USER_ACTIVATED";
    pub const USER_SUSPENDED: &str = "USER_SUSPENDED";
    pub const USER_DELETED: &str = "USER_DELETED";
    pub const PRODUCT_CREATED: &str = "PRODUCT_CREATED";
    pub const PRODUCT_RESERVED: &str = "PRODUCT_RESERVED";
    pub const PRODUCT_STOCK_UPDATED: &str = "PRODUCT_STOCK_UPDATED";
}

/// Data for USER_CREATED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreatedData {
    pub user_id: UserId,
    pub email: Email,
    pub name: String,
}

/// Data for USER_UPDATED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdatedData {
    pub user_id: UserId,
    pub email: Email,
    pub name: String,

    /// Names of the fields that changed (`name`, `email`).
    pub changed_fields: Vec<String>,
}

/// Data for USER_ACTIVATED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivatedData {
    pub user_id: UserId,
    pub email: Email,
    pub name: String,

    /// Who performed the activation.
    pub activated_by: String,
    pub activated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Data for USER_SUSPENDED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSuspendedData {
    pub user_id: UserId,
    pub email: Email,
    pub suspended_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Data for USER_DELETED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeletedData {
    pub user_id: UserId,
    pub email: Email,
}

/// Data for PRODUCT_CREATED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreatedData {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

/// Data for PRODUCT_RESERVED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReservedData {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub quantity: u32,
    pub reservation_id: String,

    /// Stock left after the reservation.
    pub remaining_stock: u32,
}

/// Data for PRODUCT_STOCK_UPDATED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStockUpdatedData {
    pub product_id: ProductId,
    pub old_stock: u32,
    pub new_stock: u32,
}
