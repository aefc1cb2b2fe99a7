//! Subcommand implementations

pub mod balances;
pub mod price_diff;
pub mod snapshot;
pub mod track;

use anyhow::{Context, Result};
use crypto_price_reports::exchange::{connect, ExchangeKind};
use crypto_price_reports::pricing::PriceSource;
use tracing::info;

/// Fetch the full price table of each exchange, in order. Any failure is fatal.
fn fetch_price_sources(kinds: &[ExchangeKind]) -> Result<Vec<PriceSource>> {
    kinds
        .iter()
        .map(|&kind| {
            let exchange = connect(kind, None)?;
            let table = exchange
                .fetch_prices()
                .with_context(|| format!("Failed to fetch {} prices", kind))?;
            info!("Fetched {} prices from {}", table.len(), kind);
            Ok(PriceSource::new(kind, table))
        })
        .collect()
}

/// Print a section banner in the console report style
fn banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}
