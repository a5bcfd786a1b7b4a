//! Pagination utilities shared by every list endpoint.
//!
//! Callers hand in an already-parsed [`PaginationRequest`]; the access layer
//! normalizes it into a [`PageWindow`] and reports a [`PaginationResult`]
//! computed from the same window.

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Upper bound applied to every requested page size.
pub const MAX_PAGE_SIZE: i64 = 100;
/// Largest OFFSET the SQL backends bind (a signed 64-bit integer).
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Pagination parameters as received from the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationRequest {
    /// 1-based page index
    pub page: i64,
    /// items per page
    pub limit: i64,
}

impl PaginationRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    /// Clamp `page` to `>= 1` and `limit` to `1..=max_limit`.
    pub fn normalize(self, max_limit: i64) -> PageWindow {
        let max_limit = max_limit.max(1);
        let page = self.page.max(1);
        let limit = self.limit.clamp(1, max_limit);
        PageWindow { page: page as u64, limit: limit as u64 }
    }
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE }
    }
}

/// A normalized page: always `page >= 1` and `limit >= 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Number of rows to skip before this page starts, capped at
    /// [`MAX_OFFSET`]. Pages that far out are simply empty.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit).min(MAX_OFFSET)
    }
}

/// Pagination metadata returned next to a page of data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult {
    pub current_page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total_records: u64,
}

impl PaginationResult {
    pub fn new(window: PageWindow, total_records: u64) -> Self {
        let total_pages = if total_records == 0 { 0 } else { total_records.div_ceil(window.limit) };
        Self {
            current_page: window.page,
            page_size: window.limit,
            total_pages,
            total_records,
        }
    }
}

/// One page of records plus its metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PaginationResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_below_one() {
        let w = PaginationRequest { page: 0, limit: 0 }.normalize(MAX_PAGE_SIZE);
        assert_eq!(w.page, 1);
        assert_eq!(w.limit, 1);
        assert_eq!(w.skip(), 0);

        let w = PaginationRequest { page: -3, limit: -10 }.normalize(MAX_PAGE_SIZE);
        assert_eq!(w.page, 1);
        assert_eq!(w.limit, 1);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let w = PaginationRequest { page: 5, limit: 1000 }.normalize(MAX_PAGE_SIZE);
        assert_eq!(w.page, 5);
        assert_eq!(w.limit, 100);
        assert_eq!(w.skip(), 400);
    }

    #[test]
    fn huge_page_keeps_offset_bindable() {
        let w = PaginationRequest::new(i64::MAX, 100).normalize(MAX_PAGE_SIZE);
        assert_eq!(w.page, i64::MAX as u64);
        assert_eq!(w.skip(), MAX_OFFSET);
        assert!(i64::try_from(w.skip()).is_ok());
    }

    #[test]
    fn default_values_are_sane() {
        let d = PaginationRequest::default();
        assert_eq!(d.page, 1);
        assert_eq!(d.limit, 20);
    }

    #[test]
    fn total_pages_rounds_up() {
        let w = PaginationRequest::new(1, 10).normalize(MAX_PAGE_SIZE);
        assert_eq!(PaginationResult::new(w, 0).total_pages, 0);
        assert_eq!(PaginationResult::new(w, 1).total_pages, 1);
        assert_eq!(PaginationResult::new(w, 10).total_pages, 1);
        assert_eq!(PaginationResult::new(w, 11).total_pages, 2);
    }

    #[test]
    fn result_serializes_camel_case() {
        let w = PaginationRequest::new(2, 5).normalize(MAX_PAGE_SIZE);
        let json = serde_json::to_value(PaginationResult::new(w, 12)).unwrap();
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["pageSize"], 5);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["totalRecords"], 12);
    }
}
