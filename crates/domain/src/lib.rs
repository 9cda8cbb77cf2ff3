//! Domain layer for the catalog service.
//!
//! This crate provides:
//! - Self-validating value objects (`Email`, `Money`, `UserId`, `ProductId`)
//! - The `User` and `Product` entities and their business rules
//! - Domain errors with stable codes
//! - Domain events published by the application layer

pub mod error;
pub mod events;
pub mod product;
pub mod user;
pub mod value_objects;

pub use error::DomainError;
pub use events::{DomainEvent, EventPayload, event_types};
pub use product::{Product, ProductDetails, ProductError};
pub use user::{User, UserError, UserStatus};
pub use value_objects::{Currency, Email, Money, ProductId, UserId, ValueError};
