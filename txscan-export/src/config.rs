//! Runtime configuration loaded from `config.toml`.
//!
//! Holds the explorer endpoint and the fetch tunables (page size, page cap,
//! throttle delay, retry schedule). When no config file is present the
//! built-in defaults are used; the API key is normally supplied through the
//! `ETHERSCAN_API_KEY` environment variable instead of the file.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::client::ClientSettings;
use crate::paginator::PageSettings;

/// Default explorer endpoint (multichain v2 API).
pub const DEFAULT_BASE_URL: &str = "https://api.etherscan.io/v2/api";

/// Most records the explorer returns for one page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Deepest record (`page * offset`) the explorer will serve for one query.
pub const RESULT_WINDOW: u64 = 10_000;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Explorer endpoint settings.
    pub api: ApiConfig,
    /// Pagination and retry tunables.
    pub fetch: FetchConfig,
}

/// Explorer endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the explorer API.
    pub base_url: String,
    /// EIP-155 chain ID passed as `chainid`.
    pub chain_id: u64,
    /// API key; overridden by `--api-key` / `ETHERSCAN_API_KEY`.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            chain_id: 1,
            api_key: None,
            request_timeout_secs: 30,
        }
    }
}

/// Pagination and retry tunables.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Records requested per page (the explorer caps `offset` at 100 for
    /// paginated list queries).
    pub page_size: u32,
    /// Maximum pages fetched per category.
    pub page_cap: u32,
    /// Minimum spacing between consecutive outbound calls.
    pub min_call_delay_ms: u64,
    /// Attempts per call before giving up.
    pub max_attempts: u32,
    /// First backoff delay; doubles per retry.
    pub initial_backoff_ms: u64,
    /// Backoff ceiling.
    pub max_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            page_cap: 50,
            min_call_delay_ms: 200,
            max_attempts: 5,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 16_000,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields [`Config::default`]. Values are checked with
    /// [`Config::validate`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if a tunable is out of range.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating {}", path.display()))?;
        Ok(config)
    }

    /// Check tunables that would make the fetch loop meaningless.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let fetch = &self.fetch;
        ensure!(fetch.page_size > 0, "fetch.page_size must be at least 1");
        ensure!(
            fetch.page_size <= MAX_PAGE_SIZE,
            "fetch.page_size must not exceed {MAX_PAGE_SIZE}, the explorer's page limit"
        );
        ensure!(fetch.page_cap > 0, "fetch.page_cap must be at least 1");
        ensure!(
            u64::from(fetch.page_size) * u64::from(fetch.page_cap) <= RESULT_WINDOW,
            "fetch.page_size * fetch.page_cap must not exceed {RESULT_WINDOW}, \
             the explorer's result window"
        );
        ensure!(fetch.max_attempts > 0, "fetch.max_attempts must be at least 1");
        ensure!(
            fetch.initial_backoff_ms <= fetch.max_backoff_ms,
            "fetch.initial_backoff_ms must not exceed fetch.max_backoff_ms"
        );
        ensure!(!self.api.base_url.is_empty(), "api.base_url must not be empty");
        Ok(())
    }
}

impl FetchConfig {
    /// Throttle and retry settings for the client.
    #[must_use]
    pub const fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            min_call_delay: Duration::from_millis(self.min_call_delay_ms),
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }

    /// Page size and cap for the paginator.
    #[must_use]
    pub const fn page_settings(&self) -> PageSettings {
        PageSettings {
            page_size: self.page_size,
            page_cap: self.page_cap,
        }
    }
}
