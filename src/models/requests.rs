//! Query DTOs for the gateway API
//!
//! Defines the structure of incoming query strings.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::filter::FilterCriteria;

/// Default number of rows per list page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest page a client may ask for
pub const MAX_PAGE_SIZE: usize = 500;

/// Query string for the audit list endpoints
///
/// # Fields
/// - `search`: case-insensitive substring over the record's text fields
/// - `type`: exact record type
/// - `date`: `YYYY-MM-DD`, matches records on that calendar day
/// - `page` / `page_size`: 1-based pagination
/// - `refresh`: bypass the cached upstream list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

impl ListQuery {
    /// Builds filter criteria, or explains which parameter is unusable.
    pub fn criteria(&self) -> Result<FilterCriteria, String> {
        let mut criteria = FilterCriteria::new()
            .with_search(self.search.clone().unwrap_or_default())
            .with_type(self.record_type.clone().unwrap_or_default());

        if let Some(raw) = self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| format!("date must be YYYY-MM-DD, got {raw:?}"))?;
            criteria = criteria.on_day(day);
        }
        Ok(criteria)
    }

    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Validates the pagination parameters
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        let size = self.page_size();
        if size == 0 {
            return Some("page_size must be at least 1".to_string());
        }
        if size > MAX_PAGE_SIZE {
            return Some(format!("page_size exceeds maximum of {MAX_PAGE_SIZE}"));
        }
        None
    }
}

/// Query string for `DELETE /cache`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearCacheQuery {
    /// Exact cache key; absent clears everything
    #[serde(default)]
    pub key: Option<String>,
}
