//! Page windows for the list endpoints that can grow without bound
//! (feedback, ideas, protocols, skill survey responses)

use beeri_core::FieldRule;
use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;

const MAX_PER_PAGE: u32 = 100;
const DEFAULT_PER_PAGE: u32 = 25;
/// No committee list comes near this; larger values are typos or abuse.
pub const MAX_PAGE: u32 = 10_000;

/// A validated page window. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Page below 1 becomes 1, page size is clamped to `1..=100`.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Window from query parameters; a page past [`MAX_PAGE`] is a 400.
    pub fn from_query(page: Option<u32>, per_page: Option<u32>) -> Result<Self, ValidationErrors> {
        let page = page.unwrap_or(1);
        if page > MAX_PAGE {
            return Err(ValidationErrors::single(
                "page",
                FieldRule::OutOfRange {
                    min: 1,
                    max: i64::from(MAX_PAGE),
                },
            ));
        }
        Ok(Self::new(page, per_page.unwrap_or(DEFAULT_PER_PAGE)))
    }

    /// SQL `OFFSET`
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    /// SQL `LIMIT`
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// One page of rows plus what the admin table needs to draw its pager
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: i64,
    pub has_next: bool,
}

impl<T> Paginated<T> {
    /// `total` is the `COUNT(*) OVER()` of the unpaged result set.
    pub fn from_rows(items: Vec<T>, total: i64, window: Pagination) -> Self {
        let per_page = i64::from(window.per_page);
        let total_pages = ((total.max(0) + per_page - 1) / per_page).max(1);
        Self {
            items,
            total,
            page: window.page,
            per_page: window.per_page,
            total_pages,
            has_next: i64::from(window.page) < total_pages,
        }
    }
}

/// `?page=&per_page=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl TryFrom<PaginationParams> for Pagination {
    type Error = ValidationErrors;

    fn try_from(params: PaginationParams) -> Result<Self, Self::Error> {
        Self::from_query(params.page, params.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_25() {
        let window = Pagination::from_query(None, None).unwrap();
        assert_eq!(window, Pagination { page: 1, per_page: 25 });
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(Pagination::new(0, 0).per_page, 1);
        assert_eq!(Pagination::new(3, 999).offset(), 200);
    }

    #[test]
    fn last_allowed_page_has_exact_offset() {
        let window = Pagination::from_query(Some(MAX_PAGE), Some(100)).unwrap();
        assert_eq!(window.offset(), 999_900);
    }

    #[test]
    fn page_beyond_limit_is_rejected() {
        let err = Pagination::from_query(Some(u32::MAX), Some(100)).unwrap_err();
        assert_eq!(err.errors()[0].field, "page");
    }

    #[test]
    fn offset_never_overflows() {
        let window = Pagination {
            page: u32::MAX,
            per_page: MAX_PER_PAGE,
        };
        assert_eq!(window.offset(), i64::from(u32::MAX - 1) * 100);
    }

    #[test]
    fn pager_fields_follow_total() {
        let page: Paginated<u8> = Paginated::from_rows(vec![], 0, Pagination::new(1, 10));
        assert_eq!((page.total_pages, page.has_next), (1, false));

        let page: Paginated<u8> = Paginated::from_rows(vec![1; 10], 25, Pagination::new(2, 10));
        assert_eq!((page.total_pages, page.has_next), (3, true));

        let page: Paginated<u8> = Paginated::from_rows(vec![1; 5], 25, Pagination::new(3, 10));
        assert!(!page.has_next);
    }
}
