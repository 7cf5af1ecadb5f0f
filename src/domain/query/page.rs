//! Page requests and paged results.

use serde::Serialize;
use serde_json::json;

use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u32,
    size: u32,
}

impl PageRequest {
    /// Validates page parameters, applying defaults for absent values.
    ///
    /// # Defaults
    ///
    /// - `number`: 1
    /// - `size`: 10
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the page number is 0 or the size is
    /// outside `1..=100`.
    pub fn new(number: Option<u32>, size: Option<u32>) -> Result<Self, AppError> {
        let number = number.unwrap_or(1);
        let size = size.unwrap_or(DEFAULT_PAGE_SIZE);

        if number == 0 {
            return Err(AppError::bad_request(
                "Page number must be greater than 0",
                json!({ "pageNumber": number }),
            ));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(AppError::bad_request(
                format!("Page size must be between 1 and {MAX_PAGE_SIZE}"),
                json!({ "pageSize": size }),
            ));
        }

        Ok(Self { number, size })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus totals over the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub total_rows: i64,
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> PagedList<T> {
    pub fn new(items: Vec<T>, total_rows: i64, page: PageRequest) -> Self {
        let total = u64::try_from(total_rows).unwrap_or(0);
        let total_pages = u32::try_from(total.div_ceil(u64::from(page.size()))).unwrap_or(u32::MAX);

        Self {
            items,
            total_rows,
            page_number: page.number(),
            page_size: page.size(),
            total_pages,
            has_previous_page: page.number() > 1,
            has_next_page: page.number() < total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedList<U> {
        PagedList {
            items: self.items.into_iter().map(f).collect(),
            total_rows: self.total_rows,
            page_number: self.page_number,
            page_size: self.page_size,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
        }
    }
}
