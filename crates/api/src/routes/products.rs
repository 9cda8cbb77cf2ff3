//! Product catalog and stock endpoints.

use std::sync::Arc;

use adapters::http::{ApiResponse, PaginatedApiResponse};
use application::commands::{
    CreateProductCommand, DeleteProductCommand, GetProductByIdQuery, ReserveProductStockCommand,
    SearchProductsQuery, UpdateProductCommand, UpdateProductStockCommand,
};
use application::dto::{PaginatedProductsDto, ProductDto, ProductReservationDto};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use super::{page_request, paginated};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub available_only: bool,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    pub user_id: String,
    pub quantity: i64,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn page_response(result: PaginatedProductsDto) -> Json<PaginatedApiResponse<ProductDto>> {
    Json(paginated(
        result.products,
        result.total,
        result.limit,
        result.offset,
        result.has_more,
    ))
}

/// GET /api/products: one page of the catalog with optional filters.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListProductsParams>,
) -> Result<Json<PaginatedApiResponse<ProductDto>>, ApiError> {
    let result = state
        .get_products
        .execute(SearchProductsQuery {
            page: page_request(params.limit, params.offset),
            search_term: non_blank(params.search),
            category: non_blank(params.category),
            available_only: params.available_only,
            min_price: params.min_price,
            max_price: params.max_price,
        })
        .await?;
    Ok(page_response(result))
}

/// GET /api/products/search?q=: matches name, description and category.
#[tracing::instrument(skip(state))]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<PaginatedApiResponse<ProductDto>>, ApiError> {
    let term = non_blank(params.q)
        .ok_or_else(|| ApiError::BadRequest("Search query 'q' is required".to_string()))?;

    let result = state
        .get_products
        .execute(SearchProductsQuery {
            page: page_request(params.limit, params.offset),
            search_term: Some(term),
            ..SearchProductsQuery::default()
        })
        .await?;
    Ok(page_response(result))
}

/// POST /api/products
#[tracing::instrument(skip(state, command))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(command): Json<CreateProductCommand>,
) -> Result<(StatusCode, Json<ApiResponse<ProductDto>>), ApiError> {
    let product = state.create_product.execute(command).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(product).with_message("Product created successfully")),
    ))
}

/// GET /api/products/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    let product = state
        .get_product
        .execute(GetProductByIdQuery { product_id })
        .await?;
    Ok(Json(ApiResponse::ok(product)))
}

/// PUT /api/products/{id}: partial update of the descriptive fields.
#[tracing::instrument(skip(state, body))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    let product = state
        .update_product
        .execute(UpdateProductCommand {
            product_id,
            name: body.name,
            description: body.description,
            price: body.price,
            currency: body.currency,
            category: body.category,
        })
        .await?;
    Ok(Json(
        ApiResponse::ok(product).with_message("Product updated successfully"),
    ))
}

/// PUT /api/products/{id}/stock
#[tracing::instrument(skip(state))]
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    Json(body): Json<UpdateStockRequest>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    let product = state
        .update_product_stock
        .execute(UpdateProductStockCommand {
            product_id,
            new_stock: body.stock,
        })
        .await?;
    Ok(Json(
        ApiResponse::ok(product).with_message("Stock updated successfully"),
    ))
}

/// DELETE /api/products/{id}
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .delete_product
        .execute(DeleteProductCommand { product_id })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/products/{id}/reserve
#[tracing::instrument(skip(state))]
pub async fn reserve(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    Json(body): Json<ReserveRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductReservationDto>>), ApiError> {
    let reservation = state
        .reserve_product_stock
        .execute(ReserveProductStockCommand {
            product_id,
            user_id: body.user_id,
            quantity: body.quantity,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(reservation).with_message("Product reserved successfully")),
    ))
}
