//! Filter Pipeline
//!
//! filter → unique types → paginate. No I/O, no state.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};

use super::records::AuditRecord;

// == Filter Criteria ==
/// Search, type and date filters. Empty/None parts match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive substring matched against the record's text fields
    pub search_query: String,
    /// Exact match on the record type
    pub type_filter: String,
    /// Calendar day the record's date must fall on
    pub date_filter: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.type_filter = record_type.into();
        self
    }

    pub fn on_day(mut self, day: NaiveDate) -> Self {
        self.date_filter = Some(day);
        self
    }

    /// Filters on the calendar day of `moment`; the time of day is ignored.
    pub fn on_day_of(self, moment: NaiveDateTime) -> Self {
        self.on_day(moment.date())
    }

    pub fn matches<R: AuditRecord>(&self, record: &R) -> bool {
        self.matches_search(record) && self.matches_type(record) && self.matches_date(record)
    }

    fn matches_search<R: AuditRecord>(&self, record: &R) -> bool {
        if self.search_query.is_empty() {
            return true;
        }
        let needle = self.search_query.to_lowercase();
        record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_type<R: AuditRecord>(&self, record: &R) -> bool {
        self.type_filter.is_empty() || record.record_type() == self.type_filter
    }

    fn matches_date<R: AuditRecord>(&self, record: &R) -> bool {
        match self.date_filter {
            None => true,
            Some(day) => record.record_date().is_some_and(|date| date.date() == day),
        }
    }
}

/// Records matching every part of `criteria`, in their original order.
pub fn filter<'a, R: AuditRecord>(records: &'a [R], criteria: &FilterCriteria) -> Vec<&'a R> {
    records.iter().filter(|r| criteria.matches(*r)).collect()
}

/// Distinct non-empty record types, sorted.
pub fn unique_types<R: AuditRecord>(records: &[R]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.record_type())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

// == Page ==
/// One page of a list plus the totals needed to render a pager.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page number actually served
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    /// `ceil(total_items / page_size)`
    pub total_pages: usize,
}

/// Slices out 1-based `page` of `page_size` records.
///
/// Page 0 is treated as page 1. A page past the end is empty, and a zero
/// `page_size` yields no items and no pages.
pub fn paginate<T>(records: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page = page.max(1);
    let total_items = records.len();

    if page_size == 0 {
        return Page {
            items: &[],
            page,
            page_size,
            total_items,
            total_pages: 0,
        };
    }

    let total_pages = total_items.div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size).min(total_items);
    let end = start.saturating_add(page_size).min(total_items);

    Page {
        items: &records[start..end],
        page,
        page_size,
        total_items,
        total_pages,
    }
}
