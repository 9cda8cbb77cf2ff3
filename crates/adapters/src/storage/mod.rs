//! Storage adapters: a JSON key/value store and repositories built on it.

mod json_store;
mod product_repository;
mod user_repository;

pub use json_store::{JsonStore, StorageError};
pub use product_repository::StorageProductRepository;
pub use user_repository::StorageUserRepository;
