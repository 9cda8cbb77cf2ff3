//! HTTP adapters: a REST client and repositories backed by a remote API.

mod client;
mod envelope;
mod product_repository;
mod user_repository;

pub use client::{ApiClient, ApiClientConfig, HttpError};
pub use envelope::{ApiResponse, ErrorBody, PaginatedApiResponse, Pagination};
pub use product_repository::HttpProductRepository;
pub use user_repository::HttpUserRepository;
