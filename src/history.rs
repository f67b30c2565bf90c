//! Transaction History
//!
//! Query state for the history list: page, search term and two filters.
//! Changing the search or a filter always returns to the first page.

use crate::api::TransactionApi;
use crate::error::{IcashError, IcashResult};
use crate::types::{Page, Transaction, TransactionKind};
use crate::utils::sanitize::sanitize_search;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Direction filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Only(TransactionKind),
}

/// Status filter offered by the history screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Accept,
    Reject,
    Timeout,
}

impl StatusFilter {
    fn param(&self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Pending => Some("pending"),
            StatusFilter::Accept => Some("accept"),
            StatusFilter::Reject => Some("reject"),
            StatusFilter::Timeout => Some("timeout"),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "accept" => Ok(StatusFilter::Accept),
            "reject" => Ok(StatusFilter::Reject),
            "timeout" => Ok(StatusFilter::Timeout),
            _ => Err(format!("Unknown status filter: {}", s)),
        }
    }
}

/// History query (`GET /transaction-history`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    page: u32,
    page_size: u32,
    search: String,
    kind: KindFilter,
    status: StatusFilter,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            kind: KindFilter::All,
            status: StatusFilter::All,
        }
    }
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn kind(&self) -> KindFilter {
        self.kind
    }

    pub fn status(&self) -> StatusFilter {
        self.status
    }

    /// Jump to a page (1-based, `0` is treated as the first page)
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = sanitize_search(term);
        self.page = 1;
    }

    pub fn set_kind(&mut self, kind: KindFilter) {
        self.kind = kind;
        self.page = 1;
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        self.status = status;
        self.page = 1;
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Query parameters; filters set to "all" and an empty search are omitted
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if !self.search.is_empty() {
            params.push(("search", self.search.clone()));
        }
        if let KindFilter::Only(kind) = self.kind {
            params.push(("type_trans", kind.as_str().to_string()));
        }
        if let Some(status) = self.status.param() {
            params.push(("status", status.to_string()));
        }
        params
    }

    /// Number of pages for `count` results, never less than one
    pub fn total_pages(&self, count: u64) -> u64 {
        let size = u64::from(self.page_size);
        count.div_ceil(size).max(1)
    }
}

/// Fetch one page of history
pub fn fetch_page<A: TransactionApi>(api: &A, query: &HistoryQuery) -> IcashResult<Page<Transaction>> {
    api.history(query)
}

/// Fetch one transaction for the detail view
pub fn fetch_detail<A: TransactionApi>(api: &A, id: u64) -> IcashResult<Transaction> {
    if id == 0 {
        return Err(IcashError::invalid_input("Identifiant de transaction invalide"));
    }
    api.transaction(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let query = HistoryQuery::new();
        assert_eq!(
            query.params(),
            vec![("page", "1".to_string()), ("page_size", "10".to_string())]
        );
    }

    #[test]
    fn test_filters_reset_page() {
        let mut query = HistoryQuery::new();
        query.set_page(4);
        query.set_status(StatusFilter::Pending);
        assert_eq!(query.page(), 1);

        query.set_page(3);
        query.set_kind(KindFilter::Only(TransactionKind::Withdrawal));
        assert_eq!(query.page(), 1);

        query.set_page(2);
        query.set_search("  REF-123 ");
        assert_eq!(query.page(), 1);

        let params = query.params();
        assert!(params.contains(&("search", "REF-123".to_string())));
        assert!(params.contains(&("type_trans", "withdrawal".to_string())));
        assert!(params.contains(&("status", "pending".to_string())));
    }

    #[test]
    fn test_total_pages() {
        let query = HistoryQuery::new();
        assert_eq!(query.total_pages(0), 1);
        assert_eq!(query.total_pages(10), 1);
        assert_eq!(query.total_pages(11), 2);
        assert_eq!(query.total_pages(95), 10);
    }

    #[test]
    fn test_page_navigation_floor() {
        let mut query = HistoryQuery::new();
        query.previous_page();
        assert_eq!(query.page(), 1);
        query.next_page();
        assert_eq!(query.page(), 2);
        query.set_page(0);
        assert_eq!(query.page(), 1);
    }
}
