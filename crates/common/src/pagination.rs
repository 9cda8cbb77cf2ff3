use serde::{Deserialize, Serialize};

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default page size used when a caller does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Offset-based page request.
///
/// Fields are signed so that untrusted input (query strings, commands) can
/// be carried as-is and normalized with [`PageRequest::clamped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    /// Creates a page request without normalizing it.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// Returns a copy with `limit` in `1..=MAX_PAGE_SIZE` and `offset >= 0`.
    pub fn clamped(&self) -> Self {
        Self {
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.max(0),
        }
    }

    /// Returns the offset as a slice index.
    pub fn start(&self) -> usize {
        usize::try_from(self.offset.max(0)).unwrap_or(usize::MAX)
    }

    /// Returns the limit as a slice length.
    pub fn len(&self) -> usize {
        usize::try_from(self.limit.max(0)).unwrap_or(usize::MAX)
    }

    /// Returns true if the request cannot yield any item.
    pub fn is_empty(&self) -> bool {
        self.limit <= 0
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// One page of results plus the size of the full result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Creates a page from already-sliced items.
    pub fn new(items: Vec<T>, total: u64, has_more: bool) -> Self {
        Self {
            items,
            total,
            has_more,
        }
    }

    /// Returns an empty page.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, false)
    }

    /// Slices a complete result set according to `request`.
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len();
        let start = request.start().min(total);
        let items: Vec<T> = all.into_iter().skip(start).take(request.len()).collect();
        let has_more = start.saturating_add(request.len()) < total;

        Self {
            items,
            total: total as u64,
            has_more,
        }
    }

    /// Converts every item, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            has_more: self.has_more,
        }
    }

    /// Converts every item with a fallible function.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Page {
            items,
            total: self.total,
            has_more: self.has_more,
        })
    }

    /// Number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if this page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_bounds_limit_and_offset() {
        assert_eq!(PageRequest::new(0, -5).clamped(), PageRequest::new(1, 0));
        assert_eq!(PageRequest::new(500, 3).clamped(), PageRequest::new(100, 3));
        assert_eq!(PageRequest::new(25, 10).clamped(), PageRequest::new(25, 10));
    }

    #[test]
    fn default_request_is_first_ten() {
        assert_eq!(PageRequest::default(), PageRequest::new(10, 0));
    }

    #[test]
    fn from_vec_slices_and_reports_more() {
        let page = Page::from_vec((1..=7).collect(), PageRequest::new(3, 2));
        assert_eq!(page.items, vec![3, 4, 5]);
        assert_eq!(page.total, 7);
        assert!(page.has_more);
    }

    #[test]
    fn from_vec_last_page_has_no_more() {
        let page = Page::from_vec((1..=7).collect(), PageRequest::new(3, 6));
        assert_eq!(page.items, vec![7]);
        assert!(!page.has_more);
    }

    #[test]
    fn from_vec_offset_past_end_is_empty() {
        let page = Page::from_vec(vec![1, 2], PageRequest::new(5, 10));
        assert!(page.is_empty());
        assert_eq!(page.total, 2);
        assert!(!page.has_more);
    }

    #[test]
    fn map_keeps_metadata() {
        let page = Page::new(vec![1, 2], 9, true).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 9);
        assert!(page.has_more);
    }

    #[test]
    fn try_map_stops_on_error() {
        let page = Page::new(vec![1, -1], 2, false);
        let result: Result<Page<u32>, String> =
            page.try_map(|n| u32::try_from(n).map_err(|e: std::num::TryFromIntError| e.to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn page_serialization_roundtrip() {
        let page = Page::new(vec!["a".to_string()], 1, false);
        let json = serde_json::to_string(&page).unwrap();
        let back: Page<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(page, back);
    }
}
