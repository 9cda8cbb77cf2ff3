//! Types shared by every layer of the catalog workspace.

pub mod pagination;

pub use pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest};
