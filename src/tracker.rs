//! Day-rollover price tracker
//!
//! Each run fetches one price per ticker and rolls the previous run's record
//! forward. The first run of a calendar day promotes the previous start-of-day
//! price to "yesterday" and starts a new day; later runs on the same day keep
//! both and only shift old/new. Whether a run is the first of its day is
//! decided by comparing a persisted date marker with today's date.
//!
//! The tracker file is tab-delimited, one row per input line (blank lines
//! included), and is replaced wholesale on every run.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::data::{
    self, format_percent, format_price, parse_decimal, percent_change, Row, NOT_AVAILABLE,
};
use crate::pricing::{lookup, PriceSource};
use crate::{Ticker, TickerLine};

/// Column names preceding the date column of the tracker header
pub const TRACKER_COLUMNS: [&str; 7] = [
    "Ticker",
    "YestDayPrice",
    "StartDayPrice",
    "OldPrice",
    "NewPrice",
    "PriceDiff",
    "CurrYestPriceDiff",
];

/// Format of the run marker and the header date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Minimum cells for a tracker row to be read back
const MIN_RECORD_CELLS: usize = 5;

// =============================================================================
// Records
// =============================================================================

/// Rolling price snapshot for one ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceRecord {
    pub yesterday_price: Option<Decimal>,
    pub start_day_price: Option<Decimal>,
    pub old_price: Option<Decimal>,
    pub new_price: Option<Decimal>,
}

impl PriceRecord {
    /// Percent change between the last two runs
    pub fn price_diff(&self) -> Option<Decimal> {
        percent_change(self.new_price?, self.old_price)
    }

    /// Percent change against yesterday's start-of-day price
    pub fn curr_yest_diff(&self) -> Option<Decimal> {
        percent_change(self.new_price?, self.yesterday_price)
    }

    /// Read a record from a tracker row (`Ticker, Yest, Start, Old, New, ...`)
    fn from_row(row: &[String]) -> Result<(Ticker, PriceRecord)> {
        let ticker = Ticker::parse(&row[0]).context("Empty ticker cell")?;
        let cell = |idx: usize| -> Result<Option<Decimal>> {
            let raw = row[idx].trim();
            if raw == NOT_AVAILABLE || raw.is_empty() {
                return Ok(None);
            }
            parse_decimal(raw)
                .map(Some)
                .with_context(|| format!("Invalid {} {:?}", TRACKER_COLUMNS[idx], raw))
        };

        let record = PriceRecord {
            yesterday_price: cell(1)?,
            start_day_price: cell(2)?,
            old_price: cell(3)?,
            new_price: cell(4)?,
        };
        Ok((ticker, record))
    }
}

/// Whether this run opens a new day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    FirstRunOfDay,
    SubsequentRunSameDay,
}

impl DayState {
    /// Compare the stored marker with today. No marker means a new day.
    pub fn from_marker(marker: Option<&str>, today: NaiveDate) -> Self {
        let today = today.format(DATE_FORMAT).to_string();
        match marker {
            Some(date) if date.trim() == today => DayState::SubsequentRunSameDay,
            _ => DayState::FirstRunOfDay,
        }
    }
}

impl std::fmt::Display for DayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayState::FirstRunOfDay => write!(f, "first run of the day"),
            DayState::SubsequentRunSameDay => write!(f, "same-day rerun"),
        }
    }
}

/// Advance a ticker's record by one run
pub fn roll_forward(previous: Option<&PriceRecord>, fetched: Decimal, state: DayState) -> PriceRecord {
    let (yesterday_price, start_day_price) = match state {
        DayState::FirstRunOfDay => (previous.and_then(|p| p.start_day_price), Some(fetched)),
        DayState::SubsequentRunSameDay => (
            previous.and_then(|p| p.yesterday_price),
            Some(previous.and_then(|p| p.start_day_price).unwrap_or(fetched)),
        ),
    };

    PriceRecord {
        yesterday_price,
        start_day_price,
        old_price: match previous {
            Some(p) => p.new_price,
            None => Some(fetched),
        },
        new_price: Some(fetched),
    }
}

// =============================================================================
// Rows
// =============================================================================

/// Outcome for one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEntry {
    Blank,
    Unresolved(Ticker),
    Tracked(Ticker, PriceRecord),
}

impl TrackerEntry {
    pub fn to_row(&self) -> Row {
        match self {
            TrackerEntry::Blank => Row::new(),
            TrackerEntry::Unresolved(ticker) => {
                let mut row = vec![ticker.to_string()];
                row.extend((1..TRACKER_COLUMNS.len()).map(|_| NOT_AVAILABLE.to_string()));
                row
            }
            TrackerEntry::Tracked(ticker, record) => vec![
                ticker.to_string(),
                format_price(record.yesterday_price),
                format_price(record.start_day_price),
                format_price(record.old_price),
                format_price(record.new_price),
                format_percent(record.price_diff()),
                format_percent(record.curr_yest_diff()),
            ],
        }
    }
}

/// Tracker header, ending with today's date
pub fn header(today: NaiveDate) -> Vec<String> {
    TRACKER_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(std::iter::once(today.format(DATE_FORMAT).to_string()))
        .collect()
}

/// Roll every input line forward against the current price sources
pub fn track(
    lines: &[TickerLine],
    sources: &[PriceSource],
    previous: &HashMap<String, PriceRecord>,
    state: DayState,
) -> Vec<TrackerEntry> {
    lines
        .iter()
        .map(|line| {
            let Some(ticker) = line.ticker() else {
                return TrackerEntry::Blank;
            };
            match lookup(ticker, sources).price() {
                Some(fetched) => {
                    let record = roll_forward(previous.get(ticker.as_str()), fetched, state);
                    TrackerEntry::Tracked(ticker.clone(), record)
                }
                None => {
                    warn!("No price for {} on any source", ticker);
                    TrackerEntry::Unresolved(ticker.clone())
                }
            }
        })
        .collect()
}

// =============================================================================
// Persistence
// =============================================================================

/// Load the previous run's records keyed by ticker. A missing file is empty.
pub fn load_records(path: impl AsRef<Path>) -> Result<HashMap<String, PriceRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No previous tracker file at {}, starting fresh", path.display());
        return Ok(HashMap::new());
    }

    let mut records = HashMap::new();
    for (idx, row) in data::read_tsv(path)?.iter().enumerate() {
        if row.len() < MIN_RECORD_CELLS {
            continue;
        }
        match PriceRecord::from_row(row) {
            Ok((ticker, record)) => {
                records.insert(ticker.as_str().to_string(), record);
            }
            Err(e) => warn!("Skipping tracker row {}: {:#}", idx + 1, e),
        }
    }

    debug!("Loaded {} previous records from {}", records.len(), path.display());
    Ok(records)
}

/// Write the tracker file atomically
pub fn save_entries(path: impl AsRef<Path>, today: NaiveDate, entries: &[TrackerEntry]) -> Result<()> {
    let rows: Vec<Row> = entries.iter().map(TrackerEntry::to_row).collect();
    data::write_tsv(path, &header(today), &rows)
}

/// Read the last run date, if any
pub fn read_marker(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read run marker {}", path.display()))?;
    let date = contents.trim();
    Ok((!date.is_empty()).then(|| date.to_string()))
}

/// Record today as the last run date
pub fn write_marker(path: impl AsRef<Path>, today: NaiveDate) -> Result<()> {
    data::write_atomic(path, today.format(DATE_FORMAT).to_string().as_bytes())
}
