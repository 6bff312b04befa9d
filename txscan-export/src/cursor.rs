//! Pagination position of a single category fetch.
//!
//! A cursor is created when a category fetch starts and dropped when it
//! finishes; it is never persisted, so every run starts at page 1.

use txscan::{BlockRange, Category};

use crate::client::Query;

/// Position of one in-flight category fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Category being fetched.
    pub category: Category,
    /// Next page to request, 1-based.
    pub page: u32,
    /// First block, inclusive.
    pub start_block: u64,
    /// Last block, inclusive.
    pub end_block: u64,
}

impl PageCursor {
    /// A cursor at page 1 of `range`.
    #[must_use]
    pub const fn start(category: Category, range: BlockRange) -> Self {
        Self {
            category,
            page: 1,
            start_block: range.start(),
            end_block: range.end(),
        }
    }

    /// The request for the current page.
    #[must_use]
    pub const fn query<'a>(&self, action: &'static str, address: &'a str, offset: u32) -> Query<'a> {
        Query {
            action,
            address,
            start_block: self.start_block,
            end_block: self.end_block,
            page: self.page,
            offset,
        }
    }

    /// Move to the next page.
    pub const fn advance(&mut self) {
        self.page += 1;
    }
}
