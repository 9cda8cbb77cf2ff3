//! Response envelopes shared by the REST API and its client.

use chrono::{DateTime, Utc};
use common::{Page, PageRequest};
use serde::{Deserialize, Serialize};

/// Envelope around a single resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data,
            message: None,
            success: true,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Paging metadata of a [`PaginatedApiResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

/// Envelope around one page of resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedApiResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

impl<T> PaginatedApiResponse<T> {
    /// Wraps a page that was produced for `request`.
    pub fn from_page(page: Page<T>, request: PageRequest) -> Self {
        Self {
            pagination: Pagination {
                total: page.total,
                limit: request.limit,
                offset: request.offset,
                has_more: page.has_more,
            },
            data: page.items,
            success: true,
            timestamp: Utc::now(),
        }
    }

    /// Drops the envelope, keeping the paging metadata.
    pub fn into_page(self) -> Page<T> {
        Page::new(self.data, self.pagination.total, self.pagination.has_more)
    }
}

/// Body of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub code: String,
}
