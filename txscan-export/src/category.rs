//! Static fetch configuration for every transaction category.
//!
//! The four explorer list endpoints differ only in their `action` and in
//! which fields their records carry, so one descriptor per category drives
//! the shared paginator and normalizer.

use tokio_util::sync::CancellationToken;
use txscan::{BlockRange, Category};

use crate::client::{LedgerApi, RateLimitedClient};
use crate::cursor::PageCursor;
use crate::paginator::{PageSettings, Paginator};

/// Fetch and normalization parameters of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySpec {
    /// The category this descriptor configures.
    pub category: Category,
    /// Explorer `action` of the list endpoint.
    pub action: &'static str,
    /// Records carry `gasUsed` and `gasPrice`.
    pub carries_gas: bool,
    /// Records carry a token ID.
    pub carries_token_id: bool,
    /// Records carry a token contract and symbol.
    pub carries_token_symbol: bool,
}

impl CategorySpec {
    /// Start paginating this category for `address` over `range`.
    #[must_use]
    pub const fn paginate<'a, A: LedgerApi>(
        &self,
        client: &'a RateLimitedClient<A>,
        address: &'a str,
        range: BlockRange,
        settings: PageSettings,
        cancel: CancellationToken,
    ) -> Paginator<'a, A> {
        Paginator::new(
            client,
            self.action,
            address,
            PageCursor::start(self.category, range),
            settings,
            cancel,
        )
    }

    /// Descriptor of `category`.
    #[must_use]
    pub const fn of(category: Category) -> &'static Self {
        match category {
            Category::External => &EXTERNAL,
            Category::Internal => &INTERNAL,
            Category::Erc20 => &ERC20,
            Category::Erc721 => &ERC721,
        }
    }
}

const EXTERNAL: CategorySpec = CategorySpec {
    category: Category::External,
    action: "txlist",
    carries_gas: true,
    carries_token_id: false,
    carries_token_symbol: false,
};

const INTERNAL: CategorySpec = CategorySpec {
    category: Category::Internal,
    action: "txlistinternal",
    carries_gas: true,
    carries_token_id: false,
    carries_token_symbol: false,
};

const ERC20: CategorySpec = CategorySpec {
    category: Category::Erc20,
    action: "tokentx",
    carries_gas: false,
    carries_token_id: false,
    carries_token_symbol: true,
};

const ERC721: CategorySpec = CategorySpec {
    category: Category::Erc721,
    action: "tokennfttx",
    carries_gas: false,
    carries_token_id: true,
    carries_token_symbol: true,
};

/// All categories in fetch order.
pub const ALL: &[CategorySpec] = &[EXTERNAL, INTERNAL, ERC20, ERC721];
