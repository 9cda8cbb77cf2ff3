//! Product repository backed by the `products` REST resource.

use application::dto::ProductDto;
use application::ports::{ProductRepository, RepositoryError};
use async_trait::async_trait;
use common::{Page, PageRequest};
use domain::{DomainError, Money, Product, ProductDetails, ProductError, ProductId, UserId};
use serde::Serialize;
use serde_json::Value;

use super::ApiClient;

const ENDPOINT: &str = "products";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateProductPayload<'a> {
    name: &'a str,
    description: &'a str,
    price: f64,
    currency: &'a str,
    stock: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProductPayload<'a> {
    name: &'a str,
    description: &'a str,
    price: f64,
    currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct StockPayload {
    stock: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReservePayload<'a> {
    user_id: &'a str,
    quantity: i64,
}

/// Rebuilds a product from its wire form.
pub(crate) fn product_from_dto(dto: ProductDto) -> Result<Product, RepositoryError> {
    let id = ProductId::parse(dto.id).map_err(DomainError::from)?;
    let price = Money::from_major(dto.price.amount, &dto.price.currency).map_err(DomainError::from)?;
    Ok(Product::restore(
        id,
        ProductDetails {
            name: dto.name,
            description: dto.description,
            price,
            category: dto.category,
        },
        dto.stock,
        dto.created_at,
        dto.updated_at,
    ))
}

/// [`ProductRepository`] over a remote REST API.
///
/// `save` updates an existing product through `PUT products/{id}` and, when
/// the stock level differs, `PUT products/{id}/stock`; unknown products are
/// created through `POST products` and get their id from the backend.
/// Reservations are posted to `products/{id}/reserve` so the backend checks
/// and takes the stock in one step.
#[derive(Debug, Clone)]
pub struct HttpProductRepository {
    client: ApiClient,
}

impl HttpProductRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn path(id: &ProductId) -> String {
        format!("{ENDPOINT}/{id}")
    }

    async fn list(
        &self,
        path: &str,
        filter: Option<(&'static str, String)>,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let mut query = vec![
            ("limit", page.limit.to_string()),
            ("offset", page.offset.to_string()),
        ];
        query.extend(filter);
        let response = self.client.get_paginated::<ProductDto>(path, &query).await?;
        response.into_page().try_map(product_from_dto)
    }

    async fn require(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("product {id}")))
    }
}

#[async_trait]
impl ProductRepository for HttpProductRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        match self.client.get::<ProductDto>(&Self::path(id), &[]).await {
            Ok(dto) => product_from_dto(dto).map(Some),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_category(
        &self,
        category: &str,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        self.list(ENDPOINT, Some(("category", category.to_string())), page)
            .await
    }

    async fn find_available(&self, page: PageRequest) -> Result<Page<Product>, RepositoryError> {
        self.list(ENDPOINT, Some(("availableOnly", "true".to_string())), page)
            .await
    }

    async fn search(
        &self,
        term: &str,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        self.list(&format!("{ENDPOINT}/search"), Some(("q", term.to_string())), page)
            .await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Product>, RepositoryError> {
        self.list(ENDPOINT, None, page).await
    }

    #[tracing::instrument(skip(self, product), fields(product_id = %product.id()))]
    async fn save(&self, product: &Product) -> Result<Product, RepositoryError> {
        let price = product.price();
        let Some(existing) = self.find_by_id(product.id()).await? else {
            let payload = CreateProductPayload {
                name: product.name(),
                description: product.description(),
                price: price.amount(),
                currency: price.currency().code(),
                stock: product.stock(),
                category: product.category(),
            };
            let dto = self
                .client
                .post::<_, ProductDto>(ENDPOINT, &payload)
                .await?;
            return product_from_dto(dto);
        };

        let payload = UpdateProductPayload {
            name: product.name(),
            description: product.description(),
            price: price.amount(),
            currency: price.currency().code(),
            category: product.category(),
        };
        let dto = self
            .client
            .put::<_, ProductDto>(&Self::path(product.id()), &payload)
            .await?;
        if existing.stock() != product.stock() {
            return self.update_stock(product.id(), product.stock()).await;
        }
        product_from_dto(dto)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        match self.client.delete(&Self::path(id)).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn update_stock(
        &self,
        id: &ProductId,
        new_stock: u32,
    ) -> Result<Product, RepositoryError> {
        let path = format!("{}/stock", Self::path(id));
        let dto = self
            .client
            .put::<_, ProductDto>(&path, &StockPayload { stock: new_stock })
            .await?;
        product_from_dto(dto)
    }

    #[tracing::instrument(skip(self))]
    async fn reserve_stock(
        &self,
        id: &ProductId,
        user_id: &UserId,
        quantity: i64,
    ) -> Result<Product, RepositoryError> {
        let current = self.require(id).await?;
        current
            .clone()
            .reserve_stock(quantity)
            .map_err(|e| RepositoryError::Rejected(e.into()))?;

        let path = format!("{}/reserve", Self::path(id));
        let payload = ReservePayload {
            user_id: user_id.as_str(),
            quantity,
        };
        match self.client.post::<_, Value>(&path, &payload).await {
            Ok(_) => self.require(id).await,
            Err(err) if err.is_conflict() => Err(RepositoryError::Rejected(
                ProductError::NotAvailable {
                    available: current.stock(),
                    requested: quantity,
                }
                .into(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let page = self.list(ENDPOINT, None, PageRequest::new(1, 0)).await?;
        Ok(page.total)
    }
}
