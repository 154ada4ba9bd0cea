//! Offset-based pagination: page/limit in, `{data, total, page, limit,
//! pages}` envelope out.

use crate::error::{OrderError, Result};
use serde::{Deserialize, Serialize};

/// Default page when the caller omits one.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size when the caller omits one.
pub const DEFAULT_LIMIT: u32 = 10;
/// Hard ceiling on page size.
pub const MAX_LIMIT: u32 = 100;

/// A validated page/limit pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Creates a page request from explicit values.
    #[must_use]
    pub const fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Creates a page request from optional values, applying the defaults
    /// page=1, limit=10.
    #[must_use]
    pub fn from_options(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT),
        }
    }

    /// Number of rows to skip: `(page - 1) * limit`.
    #[must_use]
    pub const fn offset(self) -> u64 {
        (self.page as u64)
            .saturating_sub(1)
            .saturating_mul(self.limit as u64)
    }

    /// Checks page ≥ 1 and 1 ≤ limit ≤ 100.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Validation`] listing every violated bound.
    pub fn validate(self) -> Result<()> {
        let mut violations = Vec::new();
        if self.page < 1 {
            violations.push("page must be >= 1".to_string());
        }
        if self.limit < 1 {
            violations.push("limit must be >= 1".to_string());
        }
        if self.limit > MAX_LIMIT {
            violations.push(format!("limit must be <= {MAX_LIMIT}"));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(OrderError::Validation { violations })
        }
    }
}

/// A page of results with its envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// The page contents.
    pub data: Vec<T>,
    /// Total matching rows across all pages.
    pub total: u64,
    /// 1-based page number echoed back.
    pub page: u32,
    /// Page size echoed back.
    pub limit: u32,
    /// Total page count: `ceil(total / limit)`, 0 when total is 0.
    pub pages: u32,
}

impl<T> Paginated<T> {
    /// Shapes a result envelope, computing the page count.
    #[must_use]
    pub fn new(data: Vec<T>, total: u64, page: PageRequest) -> Self {
        let pages = if page.limit == 0 {
            0
        } else {
            u32::try_from(total.div_ceil(u64::from(page.limit))).unwrap_or(u32::MAX)
        };
        Self {
            data,
            total,
            page: page.page,
            limit: page.limit,
            pages,
        }
    }

    /// Maps the page contents, preserving the envelope.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults() {
        let page = PageRequest::from_options(None, None);
        assert_eq!(page, PageRequest::new(1, 10));
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
    }

    #[test]
    fn validation_bounds() {
        assert!(PageRequest::new(1, 1).validate().is_ok());
        assert!(PageRequest::new(1, 100).validate().is_ok());
        assert!(PageRequest::new(0, 10).validate().is_err());
        assert!(PageRequest::new(1, 0).validate().is_err());
        assert!(PageRequest::new(1, 101).validate().is_err());
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page: Paginated<u8> = Paginated::new(vec![], 0, PageRequest::default());
        assert_eq!(page.pages, 0);
        assert_eq!(page.total, 0);
    }

    proptest! {
        #[test]
        fn pages_is_ceil_of_total_over_limit(total in 0u64..1_000_000, limit in 1u32..=100) {
            let page: Paginated<u8> =
                Paginated::new(vec![], total, PageRequest::new(1, limit));
            prop_assert_eq!(u64::from(page.pages), total.div_ceil(u64::from(limit)));
            prop_assert_eq!(page.pages == 0, total == 0);
        }
    }
}
