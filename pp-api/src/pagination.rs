//! Limit/offset pagination for list endpoints
//!
//! The extension pages with `page[limit]` / `page[offset]` query parameters.
//! Responses carry `links.next`/`links.prev` plus a `meta.pagination` block
//! with the total count.

use serde::Serialize;

/// Default page size when the client sends no limit
pub const DEFAULT_LIMIT: i64 = 100;

/// Upper bound protecting the service from unbounded result sets
pub const MAX_LIMIT: i64 = 500;

/// Sanitized pagination window
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Build a window from raw query values, clamping out-of-range input
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        Self { limit, offset }
    }

    /// Pagination links relative to the endpoint path
    pub fn links(&self, base: &str, total: i64) -> PageLinks {
        let next = if self.offset + self.limit < total {
            Some(format!(
                "{}?page[limit]={}&page[offset]={}",
                base,
                self.limit,
                self.offset + self.limit
            ))
        } else {
            None
        };
        let prev = if self.offset > 0 {
            Some(format!(
                "{}?page[limit]={}&page[offset]={}",
                base,
                self.limit,
                (self.offset - self.limit).max(0)
            ))
        } else {
            None
        };
        PageLinks { next, prev }
    }

    /// Meta block with the total result count
    pub fn meta(&self, total: i64) -> ListMeta {
        ListMeta {
            pagination: PaginationMeta {
                count: total,
                limit: self.limit,
                offset: self.offset,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageLinks {
    pub next: Option<String>,
    pub prev: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListMeta {
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub count: i64,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let page = Page::new(None, None);
        assert_eq!(page.limit, DEFAULT_LIMIT);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(Page::new(Some(0), None).limit, 1);
        assert_eq!(Page::new(Some(-5), None).limit, 1);
        assert_eq!(Page::new(Some(10_000), None).limit, MAX_LIMIT);
    }

    #[test]
    fn test_negative_offset_clamped() {
        assert_eq!(Page::new(None, Some(-10)).offset, 0);
    }

    #[test]
    fn test_links_middle_page() {
        let page = Page::new(Some(10), Some(10));
        let links = page.links("/api/annotations", 35);
        assert_eq!(
            links.next.as_deref(),
            Some("/api/annotations?page[limit]=10&page[offset]=20")
        );
        assert_eq!(
            links.prev.as_deref(),
            Some("/api/annotations?page[limit]=10&page[offset]=0")
        );
    }

    #[test]
    fn test_links_last_page() {
        let page = Page::new(Some(10), Some(30));
        let links = page.links("/api/annotations", 35);
        assert!(links.next.is_none());
        assert!(links.prev.is_some());
    }

    #[test]
    fn test_links_empty_result() {
        let page = Page::new(None, None);
        let links = page.links("/api/annotations", 0);
        assert!(links.next.is_none());
        assert!(links.prev.is_none());
    }
}
