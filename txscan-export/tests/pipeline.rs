//! End-to-end runs of the pipeline against a scripted explorer.

#![allow(clippy::expect_used, reason = "tests")]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use common::{ScriptedApi, WALLET, client, no_transactions, ok, page_of, rate_limited, transfer};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use txscan::{BlockRange, Category, IdentityKey, InputError};
use txscan_export::client::{ClientSettings, RateLimitedClient};
use txscan_export::export::{self, Format};
use txscan_export::paginator::PageSettings;
use txscan_export::pipeline::{CategoryStatus, Pipeline};

fn range() -> BlockRange {
    BlockRange::new(18_140_000, 18_140_100).expect("valid range")
}

fn key(hash: &str, category: Category, token_id: &str) -> IdentityKey {
    IdentityKey {
        hash: hash.to_owned(),
        category,
        token_id: token_id.to_owned(),
    }
}

fn nft(hash: &str, token_id: &str) -> serde_json::Value {
    json!({
        "hash": hash,
        "timeStamp": "1694000000",
        "from": "0x1111111111111111111111111111111111111111",
        "to": "0xd8da6bf26964af9d7eed9e03e53415d37aa96045",
        "contractAddress": "0xb47e3cd837ddf8e4c57f05d70ab865de6e193bbb",
        "tokenID": token_id,
        "tokenName": "CryptoPunks",
        "tokenSymbol": "PUNK",
        "tokenDecimal": "0"
    })
}

fn pipeline(api: ScriptedApi) -> Pipeline<ScriptedApi> {
    Pipeline::new(client(api), PageSettings::default())
}

#[tokio::test(start_paused = true)]
async fn shared_hash_across_categories_and_token_ids_is_kept() {
    let external = json!({
        "hash": "0xaaa",
        "timeStamp": "1694000000",
        "from": "0x1111111111111111111111111111111111111111",
        "to": "0xd8da6bf26964af9d7eed9e03e53415d37aa96045",
        "value": "1000000000000000000",
        "gasUsed": "21000",
        "gasPrice": "50"
    });
    let pipeline = pipeline(ScriptedApi::new(move |q| match q.action {
        "txlist" => ok(vec![external.clone(), external.clone(), external.clone()]),
        "tokennfttx" => ok(vec![nft("0xaaa", "7"), nft("0xaaa", "8")]),
        _ => no_transactions(),
    }));

    let output = pipeline.run(WALLET, range()).await.expect("valid input");

    let keys: Vec<IdentityKey> = output.records.iter().map(|r| r.identity_key()).collect();
    assert_eq!(
        keys,
        [
            key("0xaaa", Category::External, ""),
            key("0xaaa", Category::Erc721, "7"),
            key("0xaaa", Category::Erc721, "8"),
        ],
        "identity keys in fetch order"
    );

    let external = &output.records[0];
    assert_eq!(external.value.map(|v| v.to_string()).as_deref(), Some("1.0"), "value");
    let gas = external.gas.expect("gas");
    assert_eq!(gas.fee.to::<u64>(), 1_050_000, "gas fee");
    assert_eq!(output.records[1].token_symbol.as_deref(), Some("PUNK"), "symbol");

    let report = &output.report;
    assert!(!report.is_degraded(), "{report}");
    let ext = report.outcome(Category::External).expect("external outcome");
    assert_eq!((ext.admitted, ext.duplicates), (1, 2), "repeated external entries");
    let nfts = report.outcome(Category::Erc721).expect("nft outcome");
    assert_eq!((nfts.admitted, nfts.duplicates), (2, 0), "both tokens kept");
}

#[tokio::test(start_paused = true)]
async fn overlapping_pages_yield_one_record() {
    let settings = PageSettings {
        page_size: 2,
        page_cap: 50,
    };
    let api = ScriptedApi::new(|q| match (q.action, q.page) {
        ("tokentx", 1) => ok(vec![transfer("0x01"), transfer("0x02")]),
        ("tokentx", 2) => ok(vec![transfer("0x02")]),
        _ => no_transactions(),
    });
    let pipeline = Pipeline::new(client(api), settings);

    let output = pipeline.run(WALLET, range()).await.expect("valid input");

    let hashes: Vec<&str> = output.records.iter().map(|r| r.hash.as_str()).collect();
    assert_eq!(hashes, ["0x01", "0x02"], "duplicate dropped");
    let erc20 = output.report.outcome(Category::Erc20).expect("outcome");
    assert_eq!((erc20.pages, erc20.admitted, erc20.duplicates), (2, 2, 1), "counts");
}

#[tokio::test(start_paused = true)]
async fn invalid_address_makes_no_request() {
    let pipeline = pipeline(ScriptedApi::new(|_| ok(vec![])));

    for address in [
        "",
        "0x123",
        "d8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
        "0xZZdA6BF26964aF9D7eEd9e03E53415D37aA96045",
    ] {
        let err = pipeline.run(address, range()).await.expect_err(address);
        assert!(matches!(err, InputError::InvalidAddress(_)), "{address}: {err}");
    }
    assert!(pipeline.client().api().calls().is_empty(), "no requests");
}

#[tokio::test(start_paused = true)]
async fn requests_use_lowercase_address_and_category_order() {
    let pipeline = pipeline(ScriptedApi::new(|_| no_transactions()));

    let output = pipeline.run(WALLET, range()).await.expect("valid input");

    assert!(output.records.is_empty(), "nothing found");
    assert!(!output.report.is_degraded(), "empty categories complete");
    let calls = pipeline.client().api().calls();
    let actions: Vec<&str> = calls.iter().map(|c| c.action).collect();
    assert_eq!(actions, ["txlist", "txlistinternal", "tokentx", "tokennfttx"], "order");
    for call in &calls {
        assert_eq!(call.address, "0xd8da6bf26964af9d7eed9e03e53415d37aa96045", "address");
        assert_eq!(call.page, 1, "single page");
    }
}

#[tokio::test(start_paused = true)]
async fn rate_limited_category_recovers_without_loss() {
    let attempts = AtomicU32::new(0);
    let pipeline = pipeline(ScriptedApi::new(move |q| match q.action {
        "txlistinternal" if attempts.fetch_add(1, Ordering::SeqCst) < 4 => rate_limited(),
        "txlistinternal" => ok(vec![transfer("0xbbb"), transfer("0xccc")]),
        _ => no_transactions(),
    }));

    let output = pipeline.run(WALLET, range()).await.expect("valid input");

    assert_eq!(output.records.len(), 2, "records");
    assert!(output.records.iter().all(|r| r.category == Category::Internal), "internal");
    let internal = output.report.outcome(Category::Internal).expect("outcome");
    assert_eq!(internal.status, CategoryStatus::Completed, "completed after retries");
    assert_eq!(pipeline.client().api().calls_for("txlistinternal").len(), 5, "attempts");
}

#[tokio::test(start_paused = true)]
async fn failed_category_keeps_earlier_pages_and_run_continues() {
    let settings = PageSettings {
        page_size: 2,
        page_cap: 50,
    };
    let api = ScriptedApi::new(|q| match (q.action, q.page) {
        ("txlist", 1) => ok(page_of("e", 1, 2)),
        ("txlist", _) => rate_limited(),
        ("tokentx", _) => ok(vec![transfer("0xddd")]),
        _ => no_transactions(),
    });
    let pipeline = Pipeline::new(client(api), settings);

    let output = pipeline.run(WALLET, range()).await.expect("valid input");

    let report = &output.report;
    assert!(report.is_degraded(), "degraded");
    let external = report.outcome(Category::External).expect("outcome");
    assert!(matches!(external.status, CategoryStatus::Failed { .. }), "{}", external.status);
    assert_eq!((external.pages, external.admitted), (1, 2), "page 1 kept");
    assert_eq!(
        report.outcome(Category::Erc20).map(|o| o.admitted),
        Some(1),
        "later category still fetched"
    );
    assert_eq!(output.records.len(), 3, "records");
    assert_eq!(report.outcomes.len(), 4, "every category reported");
}

#[tokio::test(start_paused = true)]
async fn page_cap_is_reported_as_partial() {
    let settings = PageSettings {
        page_size: 1,
        page_cap: 3,
    };
    let api = ScriptedApi::new(|q| match q.action {
        "txlist" => ok(page_of("e", q.page, 1)),
        _ => no_transactions(),
    });
    let pipeline = Pipeline::new(client(api), settings);

    let output = pipeline.run(WALLET, range()).await.expect("valid input");

    let external = output.report.outcome(Category::External).expect("outcome");
    assert_eq!(external.status, CategoryStatus::PageCapReached, "status");
    assert_eq!((external.pages, external.admitted), (3, 3), "capped pages kept");
    assert_eq!(pipeline.client().api().calls_for("txlist").len(), 3, "requests");
}

#[tokio::test(start_paused = true)]
async fn malformed_entries_are_counted_and_skipped() {
    let pipeline = pipeline(ScriptedApi::new(|q| match q.action {
        "txlist" => ok(vec![
            transfer("0xaaa"),
            json!("not a record"),
            json!({ "from": "0x1", "to": "0x2" }),
            transfer("0xbbb"),
        ]),
        _ => no_transactions(),
    }));

    let output = pipeline.run(WALLET, range()).await.expect("valid input");

    let external = output.report.outcome(Category::External).expect("outcome");
    assert_eq!((external.admitted, external.malformed), (2, 2), "counts");
    assert_eq!(external.status, CategoryStatus::Completed, "malformed entries are not failures");
}

#[tokio::test(start_paused = true)]
async fn pre_cancelled_run_fetches_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let pipeline = pipeline(ScriptedApi::new(|_| ok(vec![]))).with_cancellation(cancel);

    let output = pipeline.run(WALLET, range()).await.expect("valid input");

    assert!(output.records.is_empty(), "no records");
    assert!(
        output.report.outcomes.iter().all(|o| o.status == CategoryStatus::Cancelled),
        "{}",
        output.report
    );
    assert!(pipeline.client().api().calls().is_empty(), "no requests");
}

#[tokio::test(start_paused = true)]
async fn cancellation_mid_run_keeps_collected_records() {
    let cancel = CancellationToken::new();
    let api = ScriptedApi::new(|q| match q.action {
        "txlist" => ok(vec![transfer("0xaaa")]),
        "txlistinternal" => rate_limited(),
        _ => ok(vec![transfer("0xfff")]),
    });
    let pipeline = Arc::new(
        Pipeline::new(
            RateLimitedClient::new(api, ClientSettings::default()),
            PageSettings::default(),
        )
        .with_cancellation(cancel.clone()),
    );

    let task = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.run(WALLET, range()).await }
    });
    // Internal transfers are backing off by now.
    tokio::time::sleep(Duration::from_secs(2)).await;
    cancel.cancel();

    let output = task.await.expect("task").expect("valid input");
    let statuses: Vec<CategoryStatus> =
        output.report.outcomes.iter().map(|o| o.status.clone()).collect();
    assert_eq!(
        statuses,
        [
            CategoryStatus::Completed,
            CategoryStatus::Cancelled,
            CategoryStatus::Cancelled,
            CategoryStatus::Cancelled,
        ],
        "statuses"
    );
    assert_eq!(output.records.len(), 1, "external record kept");
    assert!(pipeline.client().api().calls_for("tokentx").is_empty(), "no later requests");
}

#[tokio::test(start_paused = true)]
async fn run_output_exports_to_csv() {
    let pipeline = pipeline(ScriptedApi::new(|q| match q.action {
        "txlist" => ok(vec![transfer("0xaaa")]),
        "tokennfttx" => ok(vec![nft("0xaaa", "7")]),
        _ => no_transactions(),
    }));
    let output = pipeline.run(WALLET, range()).await.expect("valid input");

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("transactions.csv");
    export::write(&path, Format::Csv, &output.records).expect("export");

    let text = std::fs::read_to_string(&path).expect("read back");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "hash,type,timestamp,from,to,value,tokenId,tokenSymbol,gasUsed,gasPrice,gasFeeComputed",
        "header"
    );
    assert_eq!(
        lines[1],
        "0xaaa,External,2023-09-06 11:33:20,0x1111111111111111111111111111111111111111,\
         0xd8da6bf26964af9d7eed9e03e53415d37aa96045,0.000000000000001,,,21000,1,21000",
        "external row"
    );
    assert!(lines[2].starts_with("0xaaa,ERC721,"), "nft row: {}", lines[2]);
    assert!(lines[2].contains(",7,PUNK,,,"), "nft cells: {}", lines[2]);
    assert_eq!(lines.len(), 3, "rows");
}
