//! HTTP route handlers grouped by resource.

pub mod auth;
pub mod health;
pub mod metrics;
pub mod products;
pub mod users;

use adapters::http::PaginatedApiResponse;
use common::{DEFAULT_PAGE_SIZE, Page, PageRequest};

/// Builds a paginated envelope from the paging fields of a listing DTO.
fn paginated<T>(
    items: Vec<T>,
    total: u64,
    limit: i64,
    offset: i64,
    has_more: bool,
) -> PaginatedApiResponse<T> {
    PaginatedApiResponse::from_page(
        Page::new(items, total, has_more),
        PageRequest::new(limit, offset),
    )
}

fn page_request(limit: Option<i64>, offset: Option<i64>) -> PageRequest {
    PageRequest::new(limit.unwrap_or(DEFAULT_PAGE_SIZE), offset.unwrap_or(0))
}
