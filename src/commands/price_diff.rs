//! Price-diff command - current Bybit prices against two past instants

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use crypto_price_reports::data::{
    format_percent, format_price, load_ticker_list, percent_change, write_tsv, Row, NOT_AVAILABLE,
};
use crypto_price_reports::exchange::ExchangeKind;
use crypto_price_reports::history::{ticker_price_at, HistoricalPriceSource, HttpHistory};
use crypto_price_reports::pricing::{lookup, PriceSource};
use crypto_price_reports::TickerLine;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{info, warn};

/// Input format of both comparison datetimes
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const HEADER: [&str; 6] = [
    "Ticker",
    "Price (Datetime1)",
    "Price (Datetime2)",
    "Current Price",
    "Perc Diff (Current - Datetime1)",
    "Perc Diff (Current - Datetime2)",
];

/// Parse a local wall-clock datetime
pub fn parse_local_datetime(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT)
        .with_context(|| format!("Invalid datetime {:?}, expected {}", raw, DATETIME_FORMAT))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Datetime {:?} does not exist in the local timezone", raw))
}

fn format_diff(current: Decimal, past: Option<Decimal>) -> String {
    match percent_change(current, past) {
        Some(diff) => format!("{}%", format_percent(Some(diff))),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// One output row per input line
pub fn price_diff_rows(
    lines: &[TickerLine],
    current: &[PriceSource],
    history: &dyn HistoricalPriceSource,
    at: [DateTime<Utc>; 2],
) -> Vec<Row> {
    lines
        .iter()
        .map(|line| {
            let Some(ticker) = line.ticker() else {
                return Row::new();
            };

            let Some(price) = lookup(ticker, current).price() else {
                warn!("No current price for {}", ticker);
                let mut row = vec![ticker.to_string()];
                row.extend((1..HEADER.len()).map(|_| NOT_AVAILABLE.to_string()));
                return row;
            };

            let [past1, past2] = at.map(|t| ticker_price_at(history, ticker, t));
            if past1.is_none() || past2.is_none() {
                info!("Missing historical price for {}", ticker);
            }

            vec![
                ticker.to_string(),
                format_price(past1),
                format_price(past2),
                format_price(Some(price)),
                format_diff(price, past1),
                format_diff(price, past2),
            ]
        })
        .collect()
}

pub fn run(
    input: PathBuf,
    output: PathBuf,
    datetime1: String,
    datetime2: String,
    history_url: String,
) -> Result<()> {
    let at = [parse_local_datetime(&datetime1)?, parse_local_datetime(&datetime2)?];
    let lines = load_ticker_list(&input)?;
    let current = super::fetch_price_sources(&[ExchangeKind::Bybit])?;
    let history = HttpHistory::new(history_url)?;

    let rows = price_diff_rows(&lines, &current, &history, at);
    let header: Vec<String> = HEADER.iter().map(|c| c.to_string()).collect();
    write_tsv(&output, &header, &rows)?;

    super::banner("PRICE DIFFERENCES EXPORTED");
    println!("  Datetime 1: {}", datetime1);
    println!("  Datetime 2: {}", datetime2);
    println!("  Rows:       {}", rows.len());
    println!("  Output:     {}", output.display());
    println!("{}", "=".repeat(60));

    Ok(())
}
