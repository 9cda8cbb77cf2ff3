//! Product repository over [`JsonStore`].

use application::ports::{ProductRepository, RepositoryError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Page, PageRequest};
use domain::{DomainError, Money, Product, ProductDetails, ProductError, ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::JsonStore;

const PRODUCTS_KEY: &str = "products";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    id: String,
    name: String,
    description: String,
    price: Money,
    stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deleted_at: Option<DateTime<Utc>>,
}

impl ProductRecord {
    fn from_product(product: &Product) -> Self {
        Self {
            id: product.id().to_string(),
            name: product.name().to_string(),
            description: product.description().to_string(),
            price: product.price(),
            stock: product.stock(),
            category: product.category().map(str::to_string),
            created_at: product.created_at(),
            updated_at: product.updated_at(),
            deleted_at: None,
        }
    }

    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    fn matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(term)
            || self.description.to_lowercase().contains(term)
            || self
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(term))
    }

    fn to_product(&self) -> Result<Product, RepositoryError> {
        let id = ProductId::parse(self.id.as_str()).map_err(DomainError::from)?;
        Ok(Product::restore(
            id,
            ProductDetails {
                name: self.name.clone(),
                description: self.description.clone(),
                price: self.price,
                category: self.category.clone(),
            },
            self.stock,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// [`ProductRepository`] that keeps products as a JSON array under the
/// `products` key. Deletion is a soft delete, as for users.
///
/// Stock changes read, check and write the record under the store's write
/// lock.
#[derive(Debug, Clone)]
pub struct StorageProductRepository {
    store: JsonStore,
}

impl StorageProductRepository {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    async fn live_records(&self) -> Result<Vec<ProductRecord>, RepositoryError> {
        let records: Vec<ProductRecord> = self
            .store
            .get_item(PRODUCTS_KEY)
            .await?
            .unwrap_or_default();
        Ok(records.into_iter().filter(ProductRecord::is_live).collect())
    }

    async fn page_where(
        &self,
        page: PageRequest,
        keep: impl Fn(&ProductRecord) -> bool,
    ) -> Result<Page<Product>, RepositoryError> {
        let records: Vec<ProductRecord> = self
            .live_records()
            .await?
            .into_iter()
            .filter(|r| keep(r))
            .collect();
        Page::from_vec(records, page).try_map(|r| r.to_product())
    }

    async fn modify(
        &self,
        id: &ProductId,
        change: impl FnOnce(&mut Product) -> Result<(), ProductError>,
    ) -> Result<Product, RepositoryError> {
        self.store
            .update_item(PRODUCTS_KEY, |records: &mut Vec<ProductRecord>| {
                let record = records
                    .iter_mut()
                    .find(|r| r.is_live() && r.id == id.as_str())
                    .ok_or_else(|| RepositoryError::NotFound(format!("product {id}")))?;
                let mut product = record.to_product()?;
                change(&mut product).map_err(|e| RepositoryError::Rejected(e.into()))?;
                *record = ProductRecord::from_product(&product);
                Ok::<_, RepositoryError>(product)
            })
            .await
    }
}

#[async_trait]
impl ProductRepository for StorageProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.live_records()
            .await?
            .iter()
            .find(|r| r.id == id.as_str())
            .map(ProductRecord::to_product)
            .transpose()
    }

    async fn find_by_category(
        &self,
        category: &str,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        self.page_where(page, |r| {
            r.category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category))
        })
        .await
    }

    async fn find_available(&self, page: PageRequest) -> Result<Page<Product>, RepositoryError> {
        self.page_where(page, |r| r.stock > 0).await
    }

    async fn search(
        &self,
        term: &str,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let term = term.trim().to_lowercase();
        self.page_where(page, |r| r.matches(&term)).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Product>, RepositoryError> {
        self.page_where(page, |_| true).await
    }

    #[tracing::instrument(skip(self, product), fields(product_id = %product.id()))]
    async fn save(&self, product: &Product) -> Result<Product, RepositoryError> {
        let record = ProductRecord::from_product(product);
        let stored = self
            .store
            .update_item(PRODUCTS_KEY, |records: &mut Vec<ProductRecord>| {
                match records.iter().position(|r| r.is_live() && r.id == record.id) {
                    Some(i) => records[i] = record.clone(),
                    None if records.iter().any(|r| r.id == record.id) => {
                        return Err(RepositoryError::NotFound(format!(
                            "product {} was deleted",
                            record.id
                        )));
                    }
                    None => records.push(record.clone()),
                }
                Ok(record)
            })
            .await?;
        stored.to_product()
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        self.store
            .update_item(PRODUCTS_KEY, |records: &mut Vec<ProductRecord>| {
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

    #[tracing::instrument(skip(self))]
    async fn update_stock(
        &self,
        id: &ProductId,
        new_stock: u32,
    ) -> Result<Product, RepositoryError> {
        self.modify(id, |product| {
            product.update_stock(i64::from(new_stock)).map(|_| ())
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn reserve_stock(
        &self,
        id: &ProductId,
        user_id: &UserId,
        quantity: i64,
    ) -> Result<Product, RepositoryError> {
        self.modify(id, |product| product.reserve_stock(quantity))
            .await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.live_records().await?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Currency;

    fn product(id: &str, name: &str, stock: i64, category: Option<&str>) -> Product {
        Product::new(
            ProductId::parse(id).unwrap(),
            ProductDetails {
                name: name.to_string(),
                description: format!("{name} description"),
                price: Money::new(10_000, Currency::Pen).unwrap(),
                category: category.map(str::to_string),
            },
            stock,
        )
        .unwrap()
    }

    async fn seeded() -> StorageProductRepository {
        let repo = StorageProductRepository::new(JsonStore::in_memory());
        for p in [
            product("prod-001", "Laptop Dell", 10, Some("Electronics")),
            product("prod-002", "Office Chair", 0, Some("Furniture")),
            product("prod-003", "Wireless Mouse", 25, Some("electronics")),
            product("prod-004", "Notebook", 3, None),
        ] {
            repo.save(&p).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_find_by_category_ignores_case() {
        let repo = seeded().await;
        let page = repo
            .find_by_category("ELECTRONICS", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_find_available_skips_empty_stock() {
        let repo = seeded().await;
        let page = repo.find_available(PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 3);
        assert!(page.items.iter().all(Product::is_available));
    }

    #[tokio::test]
    async fn test_search_matches_name_description_and_category() {
        let repo = seeded().await;

        let by_name = repo.search("mouse", PageRequest::default()).await.unwrap();
        assert_eq!(by_name.items[0].id().as_str(), "prod-003");

        let by_category = repo.search("furn", PageRequest::default()).await.unwrap();
        assert_eq!(by_category.items[0].id().as_str(), "prod-002");

        let none = repo.search("tablet", PageRequest::default()).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_stock_returns_updated_product() {
        let repo = seeded().await;
        let id = ProductId::parse("prod-002").unwrap();

        let updated = repo.update_stock(&id, 7).await.unwrap();
        assert_eq!(updated.stock(), 7);
        assert_eq!(repo.find_by_id(&id).await.unwrap().unwrap().stock(), 7);
    }

    #[tokio::test]
    async fn test_update_stock_of_missing_product_is_not_found() {
        let repo = seeded().await;
        let err = repo
            .update_stock(&ProductId::parse("prod-999").unwrap(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reserve_stock_takes_from_stock() {
        let repo = seeded().await;
        let id = ProductId::parse("prod-004").unwrap();
        let buyer = UserId::parse("user-001").unwrap();

        let reserved = repo.reserve_stock(&id, &buyer, 2).await.unwrap();
        assert_eq!(reserved.stock(), 1);

        let err = repo.reserve_stock(&id, &buyer, 2).await.unwrap_err();
        assert_eq!(err.code(), "PRODUCT_NOT_AVAILABLE");
        assert_eq!(repo.find_by_id(&id).await.unwrap().unwrap().stock(), 1);

        let err = repo
            .reserve_stock(&ProductId::parse("prod-999").unwrap(), &buyer, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_save_does_not_revive_deleted_product() {
        let repo = seeded().await;
        let id = ProductId::parse("prod-003").unwrap();
        let mouse = repo.find_by_id(&id).await.unwrap().unwrap();
        repo.delete_by_id(&id).await.unwrap();

        let err = repo.save(&mouse).await.unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound(_)));
        assert!(repo.find_by_id(&id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_product() {
        let repo = seeded().await;
        let id = ProductId::parse("prod-001").unwrap();

        assert!(repo.delete_by_id(&id).await.unwrap());
        assert!(repo.find_by_id(&id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 3);
        assert!(repo.update_stock(&id, 5).await.is_err());
        assert!(!repo.delete_by_id(&id).await.unwrap());
    }
}
