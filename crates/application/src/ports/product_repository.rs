//! Product persistence port.

use async_trait::async_trait;
use common::{Page, PageRequest};
use domain::{Product, ProductId, UserId};

use super::RepositoryError;

/// Persistence for products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products whose category matches, case-insensitively.
    async fn find_by_category(
        &self,
        category: &str,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError>;

    /// Products with stock left.
    async fn find_available(&self, page: PageRequest) -> Result<Page<Product>, RepositoryError>;

    /// Products whose name or description contains `term`, case-insensitively.
    async fn search(&self, term: &str, page: PageRequest)
    -> Result<Page<Product>, RepositoryError>;

    async fn find_all(&self, page: PageRequest) -> Result<Page<Product>, RepositoryError>;

    /// Inserts or replaces a product and returns it as stored.
    ///
    /// Saving over a deleted product fails with [`RepositoryError::NotFound`].
    async fn save(&self, product: &Product) -> Result<Product, RepositoryError>;

    /// Deletes a product. Returns false if it did not exist.
    async fn delete_by_id(&self, id: &ProductId) -> Result<bool, RepositoryError>;

    /// Sets the stock level and returns the updated product.
    async fn update_stock(
        &self,
        id: &ProductId,
        new_stock: u32,
    ) -> Result<Product, RepositoryError>;

    /// Takes `quantity` units from the stock for `user_id` and returns the
    /// updated product.
    ///
    /// The check against the current stock and the write happen as one step,
    /// so concurrent reservations can never take more than is in stock. A
    /// refused reservation is a [`RepositoryError::Rejected`].
    async fn reserve_stock(
        &self,
        id: &ProductId,
        user_id: &UserId,
        quantity: i64,
    ) -> Result<Product, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}
