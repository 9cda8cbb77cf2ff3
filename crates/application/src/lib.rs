//! Application layer for the catalog service.
//!
//! This crate provides:
//! - Ports: the traits adapters implement (repositories, notifications,
//!   logging, event bus)
//! - Commands, queries and DTOs
//! - One use case struct per operation on users and products
//! - Event handlers and the registry that wires them to the bus

pub mod commands;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod ports;
pub mod registry;
pub mod settings;
pub mod use_cases;

#[cfg(test)]
mod testing;

pub use error::{ApplicationError, Result};
pub use registry::{EventHandlerRegistry, HandlerInfo};
pub use settings::ApplicationSettings;
