//! Offset pagination for query results.
//!
//! Skip and take are applied after filtering and ordering:
//!
//! ```rust
//! use tessera_query::Pagination;
//!
//! let pagination = Pagination::new().skip(1).take(2);
//! assert_eq!(pagination.apply(vec![1, 2, 3, 4]), vec![2, 3]);
//!
//! // Page-based pagination (1-indexed)
//! let page_3 = Pagination::page(3, 25);
//! assert_eq!(page_3.skip, Some(50));
//! assert_eq!(page_3.take, Some(25));
//!
//! assert!(Pagination::new().is_empty());
//! ```

use serde::{Deserialize, Serialize};

/// Pagination configuration for queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of records to skip.
    pub skip: Option<u64>,
    /// Maximum number of records to take.
    pub take: Option<u64>,
}

impl Pagination {
    /// Create a new pagination with no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of records to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of records to take.
    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    /// Check if pagination is specified.
    pub fn is_empty(&self) -> bool {
        self.skip.is_none() && self.take.is_none()
    }

    /// Get pagination for the first N records.
    pub fn first(n: u64) -> Self {
        Self::new().take(n)
    }

    /// Get pagination for a page (1-indexed).
    pub fn page(page: u64, page_size: u64) -> Self {
        let skip = page.saturating_sub(1).saturating_mul(page_size);
        Self::new().skip(skip).take(page_size)
    }

    /// Apply skip and take to an ordered sequence.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        if self.is_empty() {
            return items;
        }
        let skip = usize::try_from(self.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let take = self
            .take
            .map(|t| usize::try_from(t).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        items.into_iter().skip(skip).take(take).collect()
    }
}
