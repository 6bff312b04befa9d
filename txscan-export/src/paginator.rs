//! Page-by-page retrieval of one category.
//!
//! A [`Paginator`] requests fixed-size pages until the explorer returns a
//! short page, the page cap is hit, a call fails, or the run is cancelled.
//! It is consumed once; fetching again needs a new paginator.

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::client::{FetchError, LedgerApi, RateLimitedClient};
use crate::cursor::PageCursor;

/// Page size and per-category page cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSettings {
    /// Records requested per page.
    pub page_size: u32,
    /// Maximum pages requested for one category.
    pub page_cap: u32,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            page_cap: 50,
        }
    }
}

/// Finite, non-restartable producer of raw record pages for one category.
#[derive(Debug)]
pub struct Paginator<'a, A> {
    client: &'a RateLimitedClient<A>,
    action: &'static str,
    address: &'a str,
    cursor: PageCursor,
    settings: PageSettings,
    cancel: CancellationToken,
    pages: u32,
    hit_page_cap: bool,
    done: bool,
}

impl<'a, A: LedgerApi> Paginator<'a, A> {
    /// Prepare a fetch of `action` starting at `cursor`.
    #[must_use]
    pub const fn new(
        client: &'a RateLimitedClient<A>,
        action: &'static str,
        address: &'a str,
        cursor: PageCursor,
        settings: PageSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            action,
            address,
            cursor,
            settings,
            cancel,
            pages: 0,
            hit_page_cap: false,
            done: false,
        }
    }

    /// Fetch the next page.
    ///
    /// Returns `None` once the category is finished. A failure is yielded
    /// once and ends the sequence; pages yielded before it stay valid.
    pub async fn next_page(&mut self) -> Option<Result<Vec<Value>, FetchError>> {
        if self.done {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.done = true;
            return Some(Err(FetchError::Cancelled));
        }

        let query = self
            .cursor
            .query(self.action, self.address, self.settings.page_size);
        let records = match self.client.call(&query, &self.cancel).await {
            Ok(records) => records,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        self.pages += 1;

        let full = u32::try_from(records.len()).unwrap_or(u32::MAX) >= self.settings.page_size;
        if !full {
            self.done = true;
        } else if self.cursor.page >= self.settings.page_cap {
            self.done = true;
            self.hit_page_cap = true;
            tracing::warn!(
                category = %self.cursor.category,
                pages = self.pages,
                "page cap reached, keeping records fetched so far"
            );
        } else {
            self.cursor.advance();
        }
        Some(Ok(records))
    }

    /// Pages successfully fetched so far.
    #[must_use]
    pub const fn pages(&self) -> u32 {
        self.pages
    }

    /// Whether pagination stopped at the page cap with more pages pending.
    #[must_use]
    pub const fn hit_page_cap(&self) -> bool {
        self.hit_page_cap
    }
}
