//! Product entity and related types.

mod entity;

pub use entity::{Product, ProductDetails};

use thiserror::Error;

/// Errors that can occur during product operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    /// No product with the given id.
    #[error("Product with id {id} not found")]
    NotFound { id: String },

    /// Not enough stock to satisfy a reservation.
    #[error("Not enough stock. Available: {available}, Requested: {requested}")]
    NotAvailable { available: u32, requested: i64 },

    /// Product data failed validation.
    #[error("Invalid product data: {0}")]
    InvalidData(String),

    /// A reservation quantity was zero or negative.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },
}

impl ProductError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ProductError::NotFound { .. } => "PRODUCT_NOT_FOUND",
            ProductError::NotAvailable { .. } => "PRODUCT_NOT_AVAILABLE",
            ProductError::InvalidData(_) => "INVALID_PRODUCT_DATA",
            ProductError::InvalidQuantity { .. } => "INVALID_QUANTITY",
        }
    }
}
