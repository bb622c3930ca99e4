// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page must be >= 1 (got {0})")]
    InvalidPage(u32),

    #[error("limit must be between 1 and 100 (got {0})")]
    InvalidLimit(u32),
}

/// 1-based page request shared by every list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Result<Self, PageError> {
        if page < 1 {
            return Err(PageError::InvalidPage(page));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(PageError::InvalidLimit(limit));
        }
        Ok(Self { page, limit })
    }

    pub fn first(limit: u32) -> Result<Self, PageError> {
        Self::new(1, limit)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// One page of results plus the total number of matching records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            limit: request.limit(),
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit))
    }

    /// Slice an already filtered and ordered collection.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Self::new(items, total, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(PageRequest::new(0, 10), Err(PageError::InvalidPage(0)));
        assert_eq!(PageRequest::new(1, 0), Err(PageError::InvalidLimit(0)));
        assert_eq!(PageRequest::new(1, 101), Err(PageError::InvalidLimit(101)));
        assert!(PageRequest::new(1, 100).is_ok());
    }

    #[test]
    fn test_slicing() {
        let request = PageRequest::new(2, 3).unwrap();
        assert_eq!(request.offset(), 3);
        let page = Paginated::from_sorted((1..=8).collect::<Vec<_>>(), request);
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 8);
        assert_eq!(page.total_pages(), 3);

        let past_end = Paginated::from_sorted((1..=8).collect::<Vec<_>>(), PageRequest::new(4, 3).unwrap());
        assert!(past_end.items.is_empty());
    }
}
