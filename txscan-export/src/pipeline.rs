//! Fetch orchestration across all categories.
//!
//! For a wallet the pipeline:
//! 1. Validates the address before any request is made.
//! 2. Paginates each category in turn (external, internal, ERC-20, ERC-721).
//! 3. Normalizes every page as it arrives and keeps only records whose
//!    identity key is new.
//! 4. Records per category whether it completed, stopped at the page cap,
//!    failed, or was cancelled. A failing category never stops the run.

use std::fmt;

use tokio_util::sync::CancellationToken;
use txscan::{BlockRange, Category, InputError, UnifiedRecord, WalletAddress};

use crate::category::{self, CategorySpec};
use crate::client::{FetchError, LedgerApi, RateLimitedClient};
use crate::dedup::Deduplicator;
use crate::normalize::{TokenMetadataCache, normalize};
use crate::paginator::PageSettings;

/// How a category fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryStatus {
    /// Every page was fetched.
    Completed,
    /// Stopped at the page cap; later pages were not fetched.
    PageCapReached,
    /// A page could not be fetched; records from earlier pages were kept.
    Failed {
        /// Description of the failure.
        reason: String,
    },
    /// The run was cancelled before or during this category.
    Cancelled,
}

impl fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::PageCapReached => f.write_str("partial (page cap reached)"),
            Self::Failed { reason } => write!(f, "failed ({reason})"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Result of fetching one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOutcome {
    /// The category.
    pub category: Category,
    /// How the fetch ended.
    pub status: CategoryStatus,
    /// Pages fetched successfully.
    pub pages: u32,
    /// Records added to the output.
    pub admitted: usize,
    /// Records dropped as already seen.
    pub duplicates: usize,
    /// Records dropped as malformed.
    pub malformed: usize,
}

impl CategoryOutcome {
    const fn new(category: Category, status: CategoryStatus) -> Self {
        Self {
            category,
            status,
            pages: 0,
            admitted: 0,
            duplicates: 0,
            malformed: 0,
        }
    }
}

impl fmt::Display for CategoryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}; {} pages, {} records, {} duplicates, {} malformed",
            self.category, self.status, self.pages, self.admitted, self.duplicates, self.malformed
        )
    }
}

/// Per-category outcomes of one run, in fetch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// One entry per category.
    pub outcomes: Vec<CategoryOutcome>,
}

impl RunReport {
    /// Outcome of `category`.
    #[must_use]
    pub fn outcome(&self, category: Category) -> Option<&CategoryOutcome> {
        self.outcomes.iter().find(|o| o.category == category)
    }

    /// Whether any category did not complete.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.status != CategoryStatus::Completed)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        Ok(())
    }
}

/// Everything a run gathered.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    /// Deduplicated records in fetch order.
    pub records: Vec<UnifiedRecord>,
    /// Per-category outcomes.
    pub report: RunReport,
}

/// Run-scoped state shared by all categories.
#[derive(Debug, Default)]
struct Collector {
    cache: TokenMetadataCache,
    dedup: Deduplicator,
    records: Vec<UnifiedRecord>,
}

/// Fetches and reconciles a wallet's activity across all categories.
#[derive(Debug)]
pub struct Pipeline<A> {
    client: RateLimitedClient<A>,
    pages: PageSettings,
    cancel: CancellationToken,
}

impl<A: LedgerApi> Pipeline<A> {
    /// Build a pipeline over `client`.
    #[must_use]
    pub fn new(client: RateLimitedClient<A>, pages: PageSettings) -> Self {
        Self {
            client,
            pages,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `cancel` to stop the run at the next page or retry boundary.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &RateLimitedClient<A> {
        &self.client
    }

    /// Fetch every category for `address` over `range`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidAddress`] before any request is made if
    /// `address` is not `0x` followed by 40 hex characters. Fetch failures
    /// are reported per category in [`RunOutput::report`] instead.
    pub async fn run(&self, address: &str, range: BlockRange) -> Result<RunOutput, InputError> {
        let address = WalletAddress::parse(address)?.to_string();
        let mut collector = Collector::default();
        let mut report = RunReport::default();

        for spec in category::ALL {
            let outcome = if self.cancel.is_cancelled() {
                CategoryOutcome::new(spec.category, CategoryStatus::Cancelled)
            } else {
                self.fetch_category(spec, &address, range, &mut collector).await
            };
            log_outcome(&outcome);
            report.outcomes.push(outcome);
        }

        tracing::info!(
            records = collector.records.len(),
            tokens = collector.cache.len(),
            "fetch finished"
        );
        Ok(RunOutput {
            records: collector.records,
            report,
        })
    }

    async fn fetch_category(
        &self,
        spec: &CategorySpec,
        address: &str,
        range: BlockRange,
        collector: &mut Collector,
    ) -> CategoryOutcome {
        tracing::info!(
            category = %spec.category,
            from = range.start(),
            to = range.end(),
            "fetching"
        );
        let mut pages = spec.paginate(
            &self.client,
            address,
            range,
            self.pages,
            self.cancel.clone(),
        );
        let mut outcome = CategoryOutcome::new(spec.category, CategoryStatus::Completed);
        let mut failure = None;

        while let Some(page) = pages.next_page().await {
            let values = match page {
                Ok(values) => values,
                Err(e) => {
                    failure = Some(e);
                    continue;
                }
            };
            for value in &values {
                match normalize(value, spec, &mut collector.cache) {
                    Ok(record) => {
                        if collector.dedup.admit(&record) {
                            collector.records.push(record);
                            outcome.admitted += 1;
                        } else {
                            outcome.duplicates += 1;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(category = %spec.category, error = %e, "dropping record");
                        outcome.malformed += 1;
                    }
                }
            }
        }

        outcome.pages = pages.pages();
        outcome.status = match failure {
            Some(FetchError::Cancelled) => CategoryStatus::Cancelled,
            Some(e) => CategoryStatus::Failed {
                reason: e.to_string(),
            },
            None if pages.hit_page_cap() => CategoryStatus::PageCapReached,
            None => CategoryStatus::Completed,
        };
        outcome
    }
}

fn log_outcome(outcome: &CategoryOutcome) {
    let category = outcome.category;
    match &outcome.status {
        CategoryStatus::Completed => tracing::info!(
            %category,
            pages = outcome.pages,
            records = outcome.admitted,
            duplicates = outcome.duplicates,
            "category complete"
        ),
        CategoryStatus::PageCapReached => tracing::warn!(
            %category,
            pages = outcome.pages,
            records = outcome.admitted,
            "category truncated at page cap"
        ),
        CategoryStatus::Failed { reason } => tracing::error!(
            %category,
            pages = outcome.pages,
            records = outcome.admitted,
            error = %reason,
            "category failed"
        ),
        CategoryStatus::Cancelled => tracing::warn!(%category, "category cancelled"),
    }
}
