//! Snapshot command - current prices from a primary and fallback exchange

use anyhow::Result;
use crypto_price_reports::data::{load_ticker_list, write_tsv, Row, NOT_AVAILABLE};
use crypto_price_reports::exchange::ExchangeKind;
use crypto_price_reports::pricing::{lookup, PriceLookup, PriceSource};
use crypto_price_reports::TickerLine;
use std::path::PathBuf;
use tracing::warn;

const NOT_FOUND: &str = "Not Found";

/// Rows of the full (`Ticker, Pair, Price`) and prices-only outputs
pub fn snapshot_rows(lines: &[TickerLine], sources: &[PriceSource]) -> (Vec<Row>, Vec<Row>) {
    let mut full = Vec::with_capacity(lines.len());
    let mut prices = Vec::with_capacity(lines.len());

    for line in lines {
        let Some(ticker) = line.ticker() else {
            full.push(Row::new());
            prices.push(Row::new());
            continue;
        };

        match lookup(ticker, sources) {
            PriceLookup::Found { pair, price, .. } => {
                full.push(vec![ticker.to_string(), pair, price.to_string()]);
                prices.push(vec![price.to_string()]);
            }
            PriceLookup::Unavailable { reason } => {
                warn!("{}: {}", ticker, reason);
                full.push(vec![
                    ticker.to_string(),
                    NOT_AVAILABLE.to_string(),
                    NOT_FOUND.to_string(),
                ]);
                prices.push(Row::new());
            }
        }
    }

    (full, prices)
}

pub fn run(
    input: PathBuf,
    full_output: PathBuf,
    prices_output: PathBuf,
    sources: Vec<ExchangeKind>,
) -> Result<()> {
    let lines = load_ticker_list(&input)?;
    let price_sources = super::fetch_price_sources(&sources)?;

    let (full, prices) = snapshot_rows(&lines, &price_sources);
    let header = |cols: &[&str]| cols.iter().map(|c| c.to_string()).collect::<Vec<_>>();
    write_tsv(&full_output, &header(&["Ticker", "Pair", "Price"]), &full)?;
    write_tsv(&prices_output, &header(&["Price"]), &prices)?;

    let found = prices.iter().filter(|r| !r.is_empty()).count();
    super::banner("PRICE SNAPSHOT EXPORTED");
    println!(
        "  Sources:     {}",
        sources.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(" -> ")
    );
    println!("  Priced:      {}/{}", found, lines.iter().filter(|l| l.ticker().is_some()).count());
    println!("  Full:        {}", full_output.display());
    println!("  Prices only: {}", prices_output.display());
    println!("{}", "=".repeat(60));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_price_reports::PriceTable;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_rows() {
        let bybit: PriceTable = [("BTCUSDT".to_string(), dec!(60000.10))].into_iter().collect();
        let mexc: PriceTable = [("PEPEBUSD".to_string(), dec!(0.00001234))].into_iter().collect();
        let sources = vec![
            PriceSource::new(ExchangeKind::Bybit, bybit),
            PriceSource::new(ExchangeKind::Mexc, mexc),
        ];
        let lines: Vec<TickerLine> = ["btc", "", "pepe", "gone"].iter().map(|l| TickerLine::parse(l)).collect();

        let (full, prices) = snapshot_rows(&lines, &sources);

        assert_eq!(
            full,
            vec![
                vec!["BTC", "BTCUSDT", "60000.10"],
                vec![],
                vec!["PEPE", "PEPEBUSD", "0.00001234"],
                vec!["GONE", "N/A", "Not Found"],
            ]
        );
        assert_eq!(
            prices,
            vec![vec!["60000.10"], vec![], vec!["0.00001234"], vec![]]
        );
    }
}
