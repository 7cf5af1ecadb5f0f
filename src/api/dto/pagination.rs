//! Filtered, paginated query input shared by every `get-by-filter` endpoint.

use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::domain::query::{FilterSpec, PageRequest, SortSpec};
use crate::error::AppError;

/// Body of `POST /{resource}/get-by-filter`.
///
/// ```json
/// {
///   "pageNumber": 1,
///   "pageSize": 10,
///   "filters": [{ "field": "name", "operator": "contains", "value": "red" }],
///   "sort": [{ "field": "name", "direction": "desc" }]
/// }
/// ```
///
/// Page numbers are accepted as numbers or numeric strings.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInputWithFilter {
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub page_number: Option<u32>,

    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub page_size: Option<u32>,

    #[serde(default)]
    pub filters: FilterSpec,

    #[serde(default)]
    pub sort: Vec<SortSpec>,
}

impl PaginationInputWithFilter {
    /// Validates the page parameters, applying defaults for absent values.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the page number is 0 or the page
    /// size is outside `1..=100`.
    pub fn page(&self) -> Result<PageRequest, AppError> {
        PageRequest::new(self.page_number, self.page_size)
    }
}
