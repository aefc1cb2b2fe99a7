//! Crypto price reports - main entry point
//!
//! This binary provides four subcommands:
//! - balances: Account value and last week's trades for every configured account
//! - price-diff: Current Bybit prices against two past datetimes
//! - snapshot: Current prices from Bybit with MEXC fallback
//! - track: Daily price tracker with run-over-run and day-over-day deltas

use anyhow::Result;
use clap::{Parser, Subcommand};
use crypto_price_reports::exchange::{parse_exchange_list, ExchangeKind};
use crypto_price_reports::history::HISTORY_API_BASE;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "crypto-price-reports")]
#[command(about = "Exchange balance, trade and price reports written to tab-delimited files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for log files
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report balances and trades of the last 7 days for every account
    Balances {
        /// Credentials file (overridden by API_KEYS_FILE)
        #[arg(long, default_value = "api_keys.json")]
        api_keys: PathBuf,

        /// Only report these exchanges (comma-separated). E.g., "bybit,bitget"
        #[arg(long)]
        exchanges: Option<String>,

        /// Skip the per-symbol trade history scan
        #[arg(long)]
        skip_trades: bool,
    },

    /// Compare current prices with prices at two past datetimes
    PriceDiff {
        /// Ticker list, one symbol per line
        #[arg(short, long, default_value = "crypto_historical_tickers.txt")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "crypto_historical_prices_with_percentages.csv")]
        output: PathBuf,

        /// First datetime, local time ("YYYY-MM-DD HH:MM:SS")
        #[arg(long)]
        datetime1: String,

        /// Second datetime, local time ("YYYY-MM-DD HH:MM:SS")
        #[arg(long)]
        datetime2: String,

        /// Base URL of the historical price service
        #[arg(long, default_value = HISTORY_API_BASE)]
        history_url: String,
    },

    /// Export current prices with exchange fallback
    Snapshot {
        /// Ticker list, one symbol per line
        #[arg(short, long, default_value = "fetch_crypto_tickers.txt")]
        input: PathBuf,

        /// Output with ticker, pair and price
        #[arg(long, default_value = "synchronized_crypto_prices_with_tabs.csv")]
        full_output: PathBuf,

        /// Output with prices only, aligned to the ticker list
        #[arg(long, default_value = "fetch_crypto_prices.csv")]
        prices_output: PathBuf,

        /// Price sources in priority order (comma-separated)
        #[arg(long, default_value = "bybit,mexc")]
        sources: String,
    },

    /// Update the daily price tracker
    Track {
        /// Ticker list, one symbol per line
        #[arg(short, long, default_value = "crypto_tickers.txt")]
        input: PathBuf,

        /// Tracker file, read and rewritten every run
        #[arg(short, long, default_value = "fetch_crypto_prices.csv")]
        output: PathBuf,

        /// File holding the date of the last run
        #[arg(long, default_value = "lastrundate.txt")]
        marker: PathBuf,

        /// Price sources in priority order (comma-separated)
        #[arg(long, default_value = "mexc")]
        sources: String,
    },
}

fn setup_logging(verbose: bool, command_name: &str, log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    // Log file naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = log_dir.join(&log_filename);

    // Filter out noisy HTTP crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never(log_dir, &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    // Same format without ANSI colors
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn parse_sources(raw: &str) -> Result<Vec<ExchangeKind>> {
    parse_exchange_list(raw).map_err(anyhow::Error::msg)
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Balances { .. } => "balances",
        Commands::PriceDiff { .. } => "price_diff",
        Commands::Snapshot { .. } => "snapshot",
        Commands::Track { .. } => "track",
    };

    setup_logging(cli.verbose, command_name, &cli.log_dir)?;

    match cli.command {
        Commands::Balances {
            api_keys,
            exchanges,
            skip_trades,
        } => {
            let exchanges = exchanges.as_deref().map(parse_sources).transpose()?;
            commands::balances::run(api_keys, exchanges, skip_trades)
        }

        Commands::PriceDiff {
            input,
            output,
            datetime1,
            datetime2,
            history_url,
        } => commands::price_diff::run(input, output, datetime1, datetime2, history_url),

        Commands::Snapshot {
            input,
            full_output,
            prices_output,
            sources,
        } => commands::snapshot::run(input, full_output, prices_output, parse_sources(&sources)?),

        Commands::Track {
            input,
            output,
            marker,
            sources,
        } => commands::track::run(input, output, marker, parse_sources(&sources)?),
    }
}
