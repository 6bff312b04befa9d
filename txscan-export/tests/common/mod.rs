//! Scripted in-memory explorer shared by the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]
#![allow(clippy::expect_used, reason = "test helpers")]

use std::sync::Mutex;

use serde_json::{Value, json};
use tokio::time::Instant;
use txscan_export::client::{ApiResponse, CallError, ClientSettings, LedgerApi, Query, RateLimitedClient};

type Handler = Box<dyn Fn(&Query<'_>) -> Result<ApiResponse, CallError> + Send + Sync>;

/// One request observed by [`ScriptedApi`].
#[derive(Debug, Clone)]
pub struct Call {
    pub action: &'static str,
    pub address: String,
    pub page: u32,
    pub offset: u32,
    pub start_block: u64,
    pub end_block: u64,
    pub at: Instant,
}

/// Answers every request with a closure and records what was asked.
pub struct ScriptedApi {
    handler: Handler,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new(
        handler: impl Fn(&Query<'_>) -> Result<ApiResponse, CallError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("call log").clone()
    }

    pub fn calls_for(&self, action: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.action == action)
            .collect()
    }
}

impl LedgerApi for ScriptedApi {
    async fn get(&self, query: &Query<'_>) -> Result<ApiResponse, CallError> {
        self.calls.lock().expect("call log").push(Call {
            action: query.action,
            address: query.address.to_owned(),
            page: query.page,
            offset: query.offset,
            start_block: query.start_block,
            end_block: query.end_block,
            at: Instant::now(),
        });
        (self.handler)(query)
    }
}

pub fn client(api: ScriptedApi) -> RateLimitedClient<ScriptedApi> {
    RateLimitedClient::new(api, ClientSettings::default())
}

pub fn ok(records: Vec<Value>) -> Result<ApiResponse, CallError> {
    Ok(ApiResponse {
        status: "1".to_owned(),
        message: "OK".to_owned(),
        result: Value::Array(records),
    })
}

pub fn no_transactions() -> Result<ApiResponse, CallError> {
    Ok(ApiResponse {
        status: "0".to_owned(),
        message: "No transactions found".to_owned(),
        result: json!([]),
    })
}

pub fn rate_limited() -> Result<ApiResponse, CallError> {
    Ok(ApiResponse {
        status: "0".to_owned(),
        message: "NOTOK".to_owned(),
        result: json!("Max calls per sec rate limit reached (5/sec)"),
    })
}

/// A minimal external transfer.
pub fn transfer(hash: &str) -> Value {
    json!({
        "hash": hash,
        "timeStamp": "1694000000",
        "from": "0x1111111111111111111111111111111111111111",
        "to": "0xd8da6bf26964af9d7eed9e03e53415d37aa96045",
        "value": "1000",
        "gasUsed": "21000",
        "gasPrice": "1"
    })
}

/// `count` transfers with hashes unique to `(tag, page)`.
pub fn page_of(tag: &str, page: u32, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| transfer(&format!("0x{tag}{page:03}{i:03}")))
        .collect()
}

pub const WALLET: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
