//! Pagination Helpers
//!
//! Limit/offset normalisation and the `Page` envelope returned by every
//! filtered listing.

use serde::{Deserialize, Serialize};

/// Page size used when the caller's limit is outside `1..=MAX_LIMIT`.
pub const DEFAULT_LIMIT: i64 = 25;

/// Largest accepted page size.
pub const MAX_LIMIT: i64 = 100;

/// A page of results together with the size of the full filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Count of every row matching the filters, independent of limit/offset
    pub total: i64,

    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, window: PageRequest) -> Self {
        Self {
            items,
            total,
            limit: window.limit,
            offset: window.offset,
        }
    }

    /// Whether rows exist past this page.
    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.items.len() as i64) < self.total
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Normalised limit/offset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    /// Normalise with the crate defaults: limits outside 1..=100 become 25.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self::clamped(limit, offset, DEFAULT_LIMIT, MAX_LIMIT)
    }

    /// Limits outside `1..=max` become `default`; negative offsets become zero.
    pub fn clamped(limit: i64, offset: i64, default: i64, max: i64) -> Self {
        let limit = if (1..=max).contains(&limit) { limit } else { default };
        Self {
            limit,
            offset: offset.max(0),
        }
    }

    /// Build from a 1-based page number. Pages past the addressable range
    /// saturate to the largest offset, which yields an empty page.
    pub fn from_page(page: i64, limit: i64) -> Self {
        let window = Self::new(limit, 0);
        let page = page.max(1);
        Self {
            limit: window.limit,
            offset: (page - 1).saturating_mul(window.limit),
        }
    }
}
