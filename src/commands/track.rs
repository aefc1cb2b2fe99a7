//! Track command - roll the daily price tracker forward by one run

use anyhow::Result;
use chrono::Local;
use crypto_price_reports::data::load_ticker_list;
use crypto_price_reports::exchange::ExchangeKind;
use crypto_price_reports::tracker::{self, DayState, TrackerEntry};
use std::path::PathBuf;
use tracing::info;

pub fn run(
    input: PathBuf,
    output: PathBuf,
    marker: PathBuf,
    sources: Vec<ExchangeKind>,
) -> Result<()> {
    let today = Local::now().date_naive();
    let lines = load_ticker_list(&input)?;
    let price_sources = super::fetch_price_sources(&sources)?;

    let last_run = tracker::read_marker(&marker)?;
    let state = DayState::from_marker(last_run.as_deref(), today);
    info!(
        "Last run {}, today {}: {}",
        last_run.as_deref().unwrap_or("never"),
        today,
        state
    );

    let previous = tracker::load_records(&output)?;
    let entries = tracker::track(&lines, &price_sources, &previous, state);

    tracker::save_entries(&output, today, &entries)?;
    tracker::write_marker(&marker, today)?;

    let tracked = entries
        .iter()
        .filter(|e| matches!(e, TrackerEntry::Tracked(..)))
        .count();
    let unresolved = entries
        .iter()
        .filter(|e| matches!(e, TrackerEntry::Unresolved(_)))
        .count();

    super::banner("PRICE TRACKER UPDATED");
    println!("  Run:        {}", state);
    println!("  Tracked:    {}", tracked);
    println!("  Not found:  {}", unresolved);
    println!("  Output:     {}", output.display());
    println!("{}", "=".repeat(60));

    Ok(())
}
