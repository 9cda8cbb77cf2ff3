//! The product entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProductError;
use crate::value_objects::{Money, ProductId};

/// Descriptive fields of a product, used when creating or restoring one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetails {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: Option<String>,
}

/// A catalog product with a stock level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    price: Money,
    stock: u32,
    category: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product.
    ///
    /// The name must not be blank and `stock` must be non-negative.
    pub fn new(id: ProductId, details: ProductDetails, stock: i64) -> Result<Self, ProductError> {
        let name = validate_name(&details.name)?;
        let stock = validate_stock(stock)?;
        let now = Utc::now();
        Ok(Self {
            id,
            name,
            description: details.description.trim().to_string(),
            price: details.price,
            stock,
            category: normalize_category(details.category),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a product from persisted data.
    pub fn restore(
        id: ProductId,
        details: ProductDetails,
        stock: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: details.name,
            description: details.description,
            price: details.price,
            stock,
            category: details.category,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true while there is stock left.
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }

    /// Takes `quantity` units out of stock.
    ///
    /// Stock is left untouched when the reservation is rejected.
    pub fn reserve_stock(&mut self, quantity: i64) -> Result<(), ProductError> {
        if quantity <= 0 {
            return Err(ProductError::InvalidQuantity { quantity });
        }
        let requested = u32::try_from(quantity)
            .ok()
            .filter(|q| *q <= self.stock)
            .ok_or(ProductError::NotAvailable {
                available: self.stock,
                requested: quantity,
            })?;
        self.stock -= requested;
        self.touch();
        Ok(())
    }

    /// Replaces the stock level and returns the previous one.
    pub fn update_stock(&mut self, new_stock: i64) -> Result<u32, ProductError> {
        let new_stock = validate_stock(new_stock)?;
        let old = self.stock;
        self.stock = new_stock;
        self.touch();
        Ok(old)
    }

    /// Applies a partial update of the descriptive fields.
    pub fn update_details(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        price: Option<Money>,
        category: Option<String>,
    ) -> Result<(), ProductError> {
        let name = name.map(validate_name).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = description {
            self.description = description.trim().to_string();
        }
        if let Some(price) = price {
            self.price = price;
        }
        if category.is_some() {
            self.category = normalize_category(category);
        }
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Product {}

fn validate_name(name: &str) -> Result<String, ProductError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ProductError::InvalidData("name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_stock(stock: i64) -> Result<u32, ProductError> {
    u32::try_from(stock).map_err(|_| {
        ProductError::InvalidData(format!("stock must be between 0 and {}, got {stock}", u32::MAX))
    })
}

// Blank categories are stored as none.
fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}
