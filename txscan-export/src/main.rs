//! Wallet activity exporter CLI.
//!
//! Fetches every external, internal, ERC-20 and ERC-721 transfer of a wallet
//! from an Etherscan-compatible explorer and writes one deduplicated table.
//!
//! # Usage
//!
//! ```bash
//! # Export full history on Ethereum mainnet to transactions.csv
//! ETHERSCAN_API_KEY=... txscan-export export 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045
//!
//! # Export a block range on Base as Parquet
//! txscan-export export 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 \
//!     --chain base --start-block 18140000 --end-block 18140100 --output base.parquet
//!
//! # List supported networks
//! txscan-export chains
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use txscan::{BlockRange, InputError, LATEST_BLOCK_SENTINEL, Network};
use txscan_export::client::{EtherscanHttp, RateLimitedClient};
use txscan_export::config::Config;
use txscan_export::export::{self, Format};
use txscan_export::pipeline::Pipeline;

/// Wallet activity exporter.
#[derive(Debug, Parser)]
#[command(name = "txscan-export", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch all transfers of a wallet and write them to a file.
    Export(ExportArgs),

    /// List the networks that can be selected with `--chain`.
    Chains,
}

#[derive(Debug, clap::Args)]
struct ExportArgs {
    /// Wallet address (`0x` followed by 40 hex characters).
    address: String,

    /// Output file.
    #[arg(long, short, default_value = "transactions.csv")]
    output: PathBuf,

    /// Output format. Inferred from the output extension if omitted.
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// First block, inclusive.
    #[arg(long, default_value_t = 0)]
    start_block: u64,

    /// Last block, inclusive. The default is a large sentinel meaning
    /// "latest", not the actual chain height.
    #[arg(long, default_value_t = LATEST_BLOCK_SENTINEL)]
    end_block: u64,

    /// Network name or EIP-155 chain ID. Overrides `api.chain_id` from the
    /// config file.
    #[arg(long)]
    chain: Option<Network>,

    /// Path to the TOML config file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Explorer API key.
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Optional `.env` with ETHERSCAN_API_KEY.
    dotenvy::dotenv().ok();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Export(args) => cmd_export(args).await,
        Command::Chains => {
            cmd_chains();
            Ok(())
        }
    }
}

/// Execute the `export` subcommand.
async fn cmd_export(args: ExportArgs) -> Result<()> {
    let range = BlockRange::new(args.start_block, args.end_block)?;
    let config = Config::load(&args.config)?;

    let network = match args.chain {
        Some(network) => network,
        None => Network::from_chain_id(config.api.chain_id)
            .ok_or_else(|| InputError::UnknownNetwork(config.api.chain_id.to_string()))?,
    };
    let Some(api_key) = args.api_key.or_else(|| config.api.api_key.clone()) else {
        bail!("no API key: pass --api-key, set ETHERSCAN_API_KEY, or set api.api_key in the config");
    };

    let transport = EtherscanHttp::new(
        config.api.base_url.as_str(),
        network.chain_id(),
        api_key,
        std::time::Duration::from_secs(config.api.request_timeout_secs),
    )
    .context("building HTTP client")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping after the current request");
                cancel.cancel();
            }
        }
    });

    let pipeline = Pipeline::new(
        RateLimitedClient::new(transport, config.fetch.client_settings()),
        config.fetch.page_settings(),
    )
    .with_cancellation(cancel);

    tracing::info!(
        address = %args.address,
        network = %network,
        from = range.start(),
        to = range.end(),
        "starting export"
    );

    let started = Instant::now();
    let output = pipeline.run(&args.address, range).await?;
    tracing::info!(
        records = output.records.len(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "fetch complete"
    );

    for outcome in &output.report.outcomes {
        tracing::info!("{outcome}");
    }
    if output.report.is_degraded() {
        tracing::warn!("some categories are incomplete; the export contains what could be fetched");
    }

    if output.records.is_empty() {
        tracing::info!("no transactions found in the given block range");
    }

    let format = args.format.unwrap_or_else(|| Format::from_path(&args.output));
    export::write(&args.output, format, &output.records)
        .with_context(|| format!("exporting to {}", args.output.display()))?;
    tracing::info!(path = %args.output.display(), records = output.records.len(), "export complete");

    Ok(())
}

/// Execute the `chains` subcommand.
#[allow(clippy::print_stdout, reason = "table output is the command's purpose")]
fn cmd_chains() {
    println!("{:<12} {:<20} Type", "Chain ID", "Name");
    println!("{}", "-".repeat(40));

    for network in Network::ALL {
        let net_type = if network.is_testnet() { "test" } else { "main" };
        println!("{:<12} {:<20} {net_type}", network.chain_id(), network.name());
    }
}
