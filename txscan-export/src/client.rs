//! Rate-limited, retrying access to the explorer API.
//!
//! Every outbound request goes through [`RateLimitedClient::call`], which
//! keeps consecutive attempts at least [`ClientSettings::min_call_delay`]
//! apart and retries transient failures with exponential backoff. The
//! actual HTTP exchange sits behind the [`LedgerApi`] trait so the fetch
//! pipeline can run against a scripted API in tests.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One page request against an account list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query<'a> {
    /// Explorer `action`, e.g. `txlist`.
    pub action: &'static str,
    /// Wallet address, `0x`-prefixed.
    pub address: &'a str,
    /// First block, inclusive.
    pub start_block: u64,
    /// Last block, inclusive.
    pub end_block: u64,
    /// 1-based page number.
    pub page: u32,
    /// Records per page.
    pub offset: u32,
}

/// Envelope returned by every explorer endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    /// `"1"` on success, `"0"` otherwise (including "no records").
    #[serde(default)]
    pub status: String,
    /// Short status text such as `OK`, `NOTOK` or `No transactions found`.
    #[serde(default)]
    pub message: String,
    /// Record array on success; an error string otherwise.
    #[serde(default)]
    pub result: Value,
}

/// A single failed attempt. All variants are treated as transient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status other than 429.
    #[error("HTTP status {0}")]
    Status(u16),
    /// The API asked us to slow down.
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// The body could not be decoded or had an unexpected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The API reported an error.
    #[error("API error: {0}")]
    Api(String),
}

/// Why a call produced no records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Every attempt failed.
    #[error("gave up after {attempts} attempts: {last}")]
    ExhaustedRetries {
        /// Attempts made.
        attempts: u32,
        /// Failure of the final attempt.
        last: CallError,
    },
    /// The run was cancelled before the call completed.
    #[error("cancelled")]
    Cancelled,
}

/// Transport seam between the client and the remote API.
pub trait LedgerApi: Send + Sync {
    /// Perform one request and decode its envelope.
    fn get(&self, query: &Query<'_>) -> impl Future<Output = Result<ApiResponse, CallError>> + Send;
}

/// Turn an envelope into a page of raw records or a transient failure.
///
/// # Errors
///
/// Returns [`CallError::RateLimited`] for rate-limit replies,
/// [`CallError::Malformed`] for a success status without a record array,
/// and [`CallError::Api`] for any other error reply.
pub fn interpret(response: ApiResponse) -> Result<Vec<Value>, CallError> {
    let ApiResponse {
        status,
        message,
        result,
    } = response;
    match result {
        Value::Array(records) if status == "1" || records.is_empty() => Ok(records),
        Value::String(text) if text.to_ascii_lowercase().contains("rate limit") => {
            Err(CallError::RateLimited(text))
        }
        _ if status != "1" && message.starts_with("No transactions found") => Ok(Vec::new()),
        other if status == "1" => Err(CallError::Malformed(format!(
            "expected a record array, got {other}"
        ))),
        other => Err(CallError::Api(format!("{message}: {other}"))),
    }
}

/// HTTP transport for Etherscan-compatible v2 explorers.
#[derive(Debug, Clone)]
pub struct EtherscanHttp {
    http: reqwest::Client,
    base_url: String,
    chain_id: u64,
    api_key: String,
}

impl EtherscanHttp {
    /// Build a transport for one chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        chain_id: u64,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("txscan-export/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            chain_id,
            api_key: api_key.into(),
        })
    }
}

impl LedgerApi for EtherscanHttp {
    async fn get(&self, query: &Query<'_>) -> Result<ApiResponse, CallError> {
        let params = [
            ("chainid", self.chain_id.to_string()),
            ("module", "account".to_owned()),
            ("action", query.action.to_owned()),
            ("address", query.address.to_owned()),
            ("startblock", query.start_block.to_string()),
            ("endblock", query.end_block.to_string()),
            ("page", query.page.to_string()),
            ("offset", query.offset.to_string()),
            ("sort", "asc".to_owned()),
            ("apikey", self.api_key.clone()),
        ];
        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CallError::RateLimited(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(CallError::Status(status.as_u16()));
        }
        response
            .json::<ApiResponse>()
            .await
            .map_err(|e| CallError::Malformed(e.without_url().to_string()))
    }
}

/// Throttle and retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    /// Minimum spacing between consecutive attempts, across all callers.
    pub min_call_delay: Duration,
    /// Attempts per call, including the first.
    pub max_attempts: u32,
    /// Wait after the first failure.
    pub initial_backoff: Duration,
    /// Upper bound for the doubling backoff.
    pub max_backoff: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            min_call_delay: Duration::from_millis(200),
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(16),
        }
    }
}

/// The only path from the pipeline to the network.
#[derive(Debug)]
pub struct RateLimitedClient<A> {
    api: A,
    settings: ClientSettings,
    last_call: Mutex<Option<Instant>>,
}

impl<A: LedgerApi> RateLimitedClient<A> {
    /// Wrap a transport.
    #[must_use]
    pub fn new(api: A, settings: ClientSettings) -> Self {
        Self {
            api,
            settings,
            last_call: Mutex::new(None),
        }
    }

    /// The wrapped transport.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Fetch one page, retrying transient failures.
    ///
    /// Backoff doubles from [`ClientSettings::initial_backoff`] up to
    /// [`ClientSettings::max_backoff`]; no wait follows the last attempt.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ExhaustedRetries`] when every attempt failed and
    /// [`FetchError::Cancelled`] when `cancel` fires first.
    pub async fn call(
        &self,
        query: &Query<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Value>, FetchError> {
        let mut backoff = self.settings.initial_backoff;
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            attempt += 1;
            self.throttle().await;
            tracing::debug!(action = query.action, page = query.page, attempt, "calling explorer");

            let error = match self.api.get(query).await.and_then(interpret) {
                Ok(records) => {
                    tracing::debug!(
                        action = query.action,
                        page = query.page,
                        records = records.len(),
                        "page received"
                    );
                    return Ok(records);
                }
                Err(e) => e,
            };

            if attempt >= self.settings.max_attempts {
                tracing::error!(
                    action = query.action,
                    page = query.page,
                    attempts = attempt,
                    error = %error,
                    "giving up"
                );
                return Err(FetchError::ExhaustedRetries {
                    attempts: attempt,
                    last: error,
                });
            }

            tracing::debug!(
                action = query.action,
                page = query.page,
                attempt,
                backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "retrying"
            );
            tokio::select! {
                () = cancel.cancelled() => return Err(FetchError::Cancelled),
                () = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(self.settings.max_backoff);
        }
    }

    /// Wait until `min_call_delay` has passed since the previous attempt.
    async fn throttle(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.settings.min_call_delay).await;
        }
        *last = Some(Instant::now());
    }
}
