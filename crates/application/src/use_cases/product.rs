//! Product use cases.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use domain::{
    Currency, DomainEvent, Money, Product, ProductDetails, ProductError, ProductId, UserError,
    UserId,
};
use serde_json::json;
use uuid::Uuid;

use super::{conclude, spawn_notification};
use crate::commands::{
    CreateProductCommand, DeleteProductCommand, GetProductByIdQuery, ReserveProductStockCommand,
    SearchProductsQuery, UpdateProductCommand, UpdateProductStockCommand,
};
use crate::dto::{PaginatedProductsDto, ProductDto, ProductReservationDto, ReservationStatus};
use crate::error::{ApplicationError, Result};
use crate::ports::{
    EventBus, LoggingPort, NotificationPort, ProductRepository, RepositoryError, UserRepository,
};
use crate::settings::ApplicationSettings;

async fn find_product(products: &dyn ProductRepository, id: &ProductId) -> Result<Product> {
    products
        .find_by_id(id)
        .await?
        .ok_or_else(|| ProductError::NotFound { id: id.to_string() }.into())
}

/// Adds a product to the catalog.
pub struct CreateProduct {
    products: Arc<dyn ProductRepository>,
    events: Arc<dyn EventBus>,
    logger: Arc<dyn LoggingPort>,
}

impl CreateProduct {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        events: Arc<dyn EventBus>,
        logger: &dyn LoggingPort,
    ) -> Self {
        Self {
            products,
            events,
            logger: logger.with_context("CreateProduct"),
        }
    }

    #[tracing::instrument(skip(self, command), fields(name = %command.name))]
    pub async fn execute(&self, command: CreateProductCommand) -> Result<ProductDto> {
        self.logger.info(
            "Creating product",
            json!({ "name": command.name, "stock": command.stock }),
        );
        let result = self.run(command).await;
        conclude(self.logger.as_ref(), "create_product", "Failed to create product", result)
    }

    async fn run(&self, command: CreateProductCommand) -> Result<ProductDto> {
        let price = Money::from_major(command.price, &command.currency)?;
        let product = Product::new(
            ProductId::generate(),
            ProductDetails {
                name: command.name,
                description: command.description,
                price,
                category: command.category,
            },
            command.stock,
        )?;

        let product = self.products.save(&product).await?;
        self.events
            .publish(DomainEvent::product_created(&product))
            .await?;

        self.logger.info(
            "Product created",
            json!({ "productId": product.id().as_str(), "price": product.price().to_string() }),
        );
        Ok(ProductDto::from(&product))
    }
}

pub struct GetProductById {
    products: Arc<dyn ProductRepository>,
    logger: Arc<dyn LoggingPort>,
}

impl GetProductById {
    pub fn new(products: Arc<dyn ProductRepository>, logger: &dyn LoggingPort) -> Self {
        Self {
            products,
            logger: logger.with_context("GetProductById"),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, query: GetProductByIdQuery) -> Result<ProductDto> {
        let result = self.run(query).await;
        conclude(self.logger.as_ref(), "get_product_by_id", "Failed to get product", result)
    }

    async fn run(&self, query: GetProductByIdQuery) -> Result<ProductDto> {
        self.logger
            .debug("Looking up product", json!({ "productId": query.product_id }));
        let id = ProductId::parse(query.product_id)?;
        let product = find_product(self.products.as_ref(), &id).await?;
        Ok(ProductDto::from(&product))
    }
}

/// Lists products with optional filters.
pub struct GetProducts {
    products: Arc<dyn ProductRepository>,
    logger: Arc<dyn LoggingPort>,
}

impl GetProducts {
    pub fn new(products: Arc<dyn ProductRepository>, logger: &dyn LoggingPort) -> Self {
        Self {
            products,
            logger: logger.with_context("GetProducts"),
        }
    }

    /// Price bounds filter the fetched page only; `total` and `has_more`
    /// describe the unfiltered source.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, query: SearchProductsQuery) -> Result<PaginatedProductsDto> {
        self.logger.info(
            "Searching products",
            json!({
                "limit": query.page.limit,
                "offset": query.page.offset,
                "searchTerm": query.search_term,
                "category": query.category,
                "availableOnly": query.available_only,
            }),
        );
        let result = self.run(query).await;
        conclude(self.logger.as_ref(), "get_products", "Failed to get products", result)
    }

    async fn run(&self, query: SearchProductsQuery) -> Result<PaginatedProductsDto> {
        if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
            if min > max {
                return Err(ApplicationError::Validation(format!(
                    "minPrice ({min}) cannot be greater than maxPrice ({max})"
                )));
            }
        }

        let page = query.page.clamped();
        let search_term = non_blank(query.search_term.as_deref());
        let category = non_blank(query.category.as_deref());

        let found = if let Some(term) = search_term {
            self.products.search(term, page).await?
        } else if let Some(category) = category {
            self.products.find_by_category(category, page).await?
        } else if query.available_only {
            self.products.find_available(page).await?
        } else {
            self.products.find_all(page).await?
        };

        let products: Vec<ProductDto> = found
            .items
            .iter()
            .map(ProductDto::from)
            .filter(|p| in_price_range(p.price.amount, query.min_price, query.max_price))
            .collect();

        self.logger.debug(
            "Products retrieved",
            json!({ "count": products.len(), "total": found.total, "hasMore": found.has_more }),
        );
        Ok(PaginatedProductsDto {
            products,
            total: found.total,
            limit: page.limit,
            offset: page.offset,
            has_more: found.has_more,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn in_price_range(amount: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_none_or(|min| amount >= min) && max.is_none_or(|max| amount <= max)
}

/// Partially updates a product's descriptive fields.
pub struct UpdateProduct {
    products: Arc<dyn ProductRepository>,
    logger: Arc<dyn LoggingPort>,
}

impl UpdateProduct {
    pub fn new(products: Arc<dyn ProductRepository>, logger: &dyn LoggingPort) -> Self {
        Self {
            products,
            logger: logger.with_context("UpdateProduct"),
        }
    }

    #[tracing::instrument(skip(self, command), fields(product_id = %command.product_id))]
    pub async fn execute(&self, command: UpdateProductCommand) -> Result<ProductDto> {
        self.logger
            .info("Updating product", json!({ "productId": command.product_id }));
        let result = self.run(command).await;
        conclude(self.logger.as_ref(), "update_product", "Failed to update product", result)
    }

    async fn run(&self, command: UpdateProductCommand) -> Result<ProductDto> {
        let id = ProductId::parse(command.product_id)?;
        let mut product = find_product(self.products.as_ref(), &id).await?;

        let price = match (command.price, command.currency.as_deref()) {
            (Some(amount), currency) => Some(Money::from_major(
                amount,
                currency.unwrap_or(product.price().currency().code()),
            )?),
            (None, Some(currency)) => {
                let currency: Currency = currency.parse()?;
                Some(Money::new(product.price().cents(), currency)?)
            }
            (None, None) => None,
        };

        product.update_details(
            command.name.as_deref(),
            command.description.as_deref(),
            price,
            command.category,
        )?;
        let product = self.products.save(&product).await?;

        self.logger
            .info("Product updated", json!({ "productId": id.as_str() }));
        Ok(ProductDto::from(&product))
    }
}

/// Replaces a product's stock level.
pub struct UpdateProductStock {
    products: Arc<dyn ProductRepository>,
    events: Arc<dyn EventBus>,
    logger: Arc<dyn LoggingPort>,
}

impl UpdateProductStock {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        events: Arc<dyn EventBus>,
        logger: &dyn LoggingPort,
    ) -> Self {
        Self {
            products,
            events,
            logger: logger.with_context("UpdateProductStock"),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, command: UpdateProductStockCommand) -> Result<ProductDto> {
        self.logger.info(
            "Updating product stock",
            json!({ "productId": command.product_id, "newStock": command.new_stock }),
        );
        let result = self.run(command).await;
        conclude(
            self.logger.as_ref(),
            "update_product_stock",
            "Failed to update product stock",
            result,
        )
    }

    async fn run(&self, command: UpdateProductStockCommand) -> Result<ProductDto> {
        let id = ProductId::parse(command.product_id)?;
        let mut product = find_product(self.products.as_ref(), &id).await?;

        let old_stock = product.update_stock(command.new_stock)?;
        let updated = self.products.update_stock(&id, product.stock()).await?;
        self.events
            .publish(DomainEvent::product_stock_updated(&updated, old_stock))
            .await?;

        self.logger.info(
            "Product stock updated",
            json!({ "productId": id.as_str(), "oldStock": old_stock, "newStock": updated.stock() }),
        );
        Ok(ProductDto::from(&updated))
    }
}

pub struct DeleteProduct {
    products: Arc<dyn ProductRepository>,
    logger: Arc<dyn LoggingPort>,
}

impl DeleteProduct {
    pub fn new(products: Arc<dyn ProductRepository>, logger: &dyn LoggingPort) -> Self {
        Self {
            products,
            logger: logger.with_context("DeleteProduct"),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, command: DeleteProductCommand) -> Result<()> {
        self.logger
            .info("Deleting product", json!({ "productId": command.product_id }));
        let result = self.run(command).await;
        conclude(self.logger.as_ref(), "delete_product", "Failed to delete product", result)
    }

    async fn run(&self, command: DeleteProductCommand) -> Result<()> {
        let id = ProductId::parse(command.product_id)?;
        find_product(self.products.as_ref(), &id).await?;

        if !self.products.delete_by_id(&id).await? {
            return Err(RepositoryError::Storage(format!("failed to delete product {id}")).into());
        }

        self.logger
            .info("Product deleted", json!({ "productId": id.as_str() }));
        Ok(())
    }
}

/// Reserves stock of a product for a user.
pub struct ReserveProductStock {
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn NotificationPort>,
    events: Arc<dyn EventBus>,
    logger: Arc<dyn LoggingPort>,
    low_stock_threshold: u32,
    reservation_ttl: std::time::Duration,
}

impl ReserveProductStock {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn NotificationPort>,
        events: Arc<dyn EventBus>,
        logger: &dyn LoggingPort,
        settings: &ApplicationSettings,
    ) -> Self {
        Self {
            products,
            users,
            notifier,
            events,
            logger: logger.with_context("ReserveProductStock"),
            low_stock_threshold: settings.low_stock_threshold,
            reservation_ttl: settings.reservation_ttl,
        }
    }

    /// On success the reservation is active until the configured TTL
    /// elapses. A confirmation is sent to the user and, when the remaining
    /// stock is low but not exhausted, an alert goes to inventory.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, command: ReserveProductStockCommand) -> Result<ProductReservationDto> {
        self.logger.info(
            "Starting product stock reservation",
            json!({
                "productId": command.product_id,
                "quantity": command.quantity,
                "userId": command.user_id,
            }),
        );
        let result = self.run(command).await;
        conclude(
            self.logger.as_ref(),
            "reserve_product_stock",
            "Failed to reserve product stock",
            result,
        )
    }

    async fn run(&self, command: ReserveProductStockCommand) -> Result<ProductReservationDto> {
        if command.quantity <= 0 {
            return Err(ProductError::InvalidQuantity {
                quantity: command.quantity,
            }
            .into());
        }
        let product_id = ProductId::parse(command.product_id)?;
        let user_id = UserId::parse(command.user_id)?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| UserError::NotFound {
                id: user_id.to_string(),
            })?;

        let product = match self
            .products
            .reserve_stock(&product_id, &user_id, command.quantity)
            .await
        {
            Ok(product) => product,
            Err(RepositoryError::NotFound(_)) => {
                return Err(ProductError::NotFound {
                    id: product_id.to_string(),
                }
                .into());
            }
            Err(RepositoryError::Rejected(err)) => {
                self.logger.warn(
                    "Stock reservation rejected",
                    json!({
                        "productId": product_id.as_str(),
                        "requestedQuantity": command.quantity,
                        "reason": err.to_string(),
                    }),
                );
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };
        let quantity = u32::try_from(command.quantity).unwrap_or(u32::MAX);
        let stock_before = product.stock().saturating_add(quantity);

        let reservation = self.reservation(&product_id, &user_id, quantity);
        self.events
            .publish(DomainEvent::product_reserved(
                &product,
                &user_id,
                quantity,
                &reservation.id,
            ))
            .await?;

        let notifier = Arc::clone(&self.notifier);
        let (recipient, reserved) = (user.clone(), product.clone());
        spawn_notification(Arc::clone(&self.logger), "reservation_confirmation", async move {
            notifier
                .send_reservation_confirmation(&recipient, &reserved, quantity)
                .await
        });

        let remaining = product.stock();
        if remaining > 0 && remaining <= self.low_stock_threshold {
            let notifier = Arc::clone(&self.notifier);
            let threshold = self.low_stock_threshold;
            let low = product.clone();
            spawn_notification(Arc::clone(&self.logger), "low_stock_alert", async move {
                notifier.send_low_stock_alert(&low, remaining, threshold).await
            });
        }

        self.logger.info(
            "Product stock reserved",
            json!({
                "productId": product_id.as_str(),
                "quantity": quantity,
                "userId": user_id.as_str(),
                "previousStock": stock_before,
                "newStock": remaining,
            }),
        );
        Ok(reservation)
    }

    fn reservation(
        &self,
        product_id: &ProductId,
        user_id: &UserId,
        quantity: u32,
    ) -> ProductReservationDto {
        let reserved_at = Utc::now();
        let expires_at = TimeDelta::from_std(self.reservation_ttl)
            .ok()
            .and_then(|ttl| reserved_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        ProductReservationDto {
            id: format!("reservation-{}", Uuid::new_v4()),
            product_id: product_id.to_string(),
            user_id: user_id.to_string(),
            quantity,
            reserved_at,
            expires_at,
            status: ReservationStatus::Active,
        }
    }
}
