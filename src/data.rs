//! Input and output file handling
//!
//! Ticker lists come in as plain text (one symbol per line, blank lines kept
//! in place). Reports go out as tab-delimited files that are always written
//! whole through a temp file and a rename.

use anyhow::{Context, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::TickerLine;

// =============================================================================
// Constants
// =============================================================================

/// Placeholder written for any value that could not be determined
pub const NOT_AVAILABLE: &str = "N/A";

/// Decimal places used for prices in report files
pub const PRICE_DECIMALS: u32 = 6;

/// Decimal places used for percentage differences in report files
pub const PERCENT_DECIMALS: u32 = 2;

// =============================================================================
// Ticker Lists
// =============================================================================

/// Load a ticker list, preserving blank lines positionally
pub fn load_ticker_list(path: impl AsRef<Path>) -> Result<Vec<TickerLine>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ticker list: {}", path.display()))?;

    let lines: Vec<TickerLine> = contents.lines().map(TickerLine::parse).collect();
    debug!(
        "Loaded {} lines ({} tickers) from {}",
        lines.len(),
        lines.iter().filter(|l| l.ticker().is_some()).count(),
        path.display()
    );
    Ok(lines)
}

// =============================================================================
// Decimal Parsing and Formatting
// =============================================================================

/// Parse an exchange decimal string, accepting scientific notation
pub fn parse_decimal(raw: &str) -> Result<Decimal, rust_decimal::Error> {
    let raw = raw.trim();
    Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw))
}

/// Fixed-point rendering with banker's rounding
pub fn format_fixed(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven);
    format!("{:.*}", decimals as usize, rounded)
}

/// Render an optional price, or "N/A"
pub fn format_price(value: Option<Decimal>) -> String {
    value
        .map(|v| format_fixed(v, PRICE_DECIMALS))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Render an optional percentage, or "N/A"
pub fn format_percent(value: Option<Decimal>) -> String {
    value
        .map(|v| format_fixed(v, PERCENT_DECIMALS))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Percentage change from `base` to `current`. `None` when there is no usable
/// base or the result does not fit in a `Decimal`.
pub fn percent_change(current: Decimal, base: Option<Decimal>) -> Option<Decimal> {
    let base = base.filter(|b| !b.is_zero())?;
    current
        .checked_sub(base)?
        .checked_div(base)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

// =============================================================================
// Tab-Delimited Output
// =============================================================================

/// A report row. An empty row is written as a blank line.
pub type Row = Vec<String>;

/// Render header and rows as tab-delimited text
pub fn render_tsv(header: &[String], rows: &[Row]) -> Result<Vec<u8>> {
    let mut out = render_record(header)?;
    for row in rows {
        // csv quotes a zero-width record as `""`; a blank row must stay blank
        if row.is_empty() {
            out.push(b'\n');
        } else {
            out.extend(render_record(row)?);
        }
    }
    Ok(out)
}

fn render_record(cells: &[String]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());
    writer.write_record(cells)?;
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush TSV buffer: {}", e.error()))
}

/// Write a tab-delimited report, replacing any existing file atomically
pub fn write_tsv(path: impl AsRef<Path>, header: &[String], rows: &[Row]) -> Result<()> {
    let path = path.as_ref();
    let bytes = render_tsv(header, rows)?;
    write_atomic(path, &bytes)?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Read a tab-delimited file with a header row. Blank lines are skipped.
pub fn read_tsv(path: impl AsRef<Path>) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Replace `path` with `contents` via a sibling temp file and a rename
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn strings(cells: &[&str]) -> Row {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_ticker_list_keeps_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickers.txt");
        fs::write(&path, "btc\n\n eth \n\nsol\n").unwrap();

        let lines = load_ticker_list(&path).unwrap();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], TickerLine::Blank);
        assert_eq!(lines[2].ticker().unwrap().as_str(), "ETH");
        assert_eq!(lines[3], TickerLine::Blank);
    }

    #[test]
    fn test_load_ticker_list_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_ticker_list(dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("60000.12").unwrap(), dec!(60000.12));
        assert_eq!(parse_decimal(" 0.00001 ").unwrap(), dec!(0.00001));
        assert_eq!(parse_decimal("1e-8").unwrap(), dec!(0.00000001));
        assert!(parse_decimal("N/A").is_err());
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(dec!(110), 6), "110.000000");
        assert_eq!(format_fixed(dec!(4.5454545), 2), "4.55");
        assert_eq!(format_fixed(dec!(0.125), 2), "0.12");
        assert_eq!(format_fixed(dec!(-1.005), 2), "-1.00");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_price(None), "N/A");
        assert_eq!(format_percent(Some(dec!(12.345))), "12.34");
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(dec!(110), Some(dec!(100))), Some(dec!(10)));
        assert_eq!(percent_change(dec!(110), None), None);
        assert_eq!(percent_change(dec!(110), Some(Decimal::ZERO)), None);
    }

    #[test]
    fn test_percent_change_overflow_is_none() {
        let tiny = dec!(0.0000000000000000000000000001);
        assert_eq!(percent_change(dec!(60000), Some(tiny)), None);
        assert_eq!(format_percent(percent_change(Decimal::MAX, Some(dec!(0.5)))), "N/A");
    }

    #[test]
    fn test_render_tsv_blank_rows() {
        let header = strings(&["Ticker", "Price"]);
        let rows = vec![strings(&["BTC", "1.5"]), Vec::new(), strings(&["ETH", "2"])];

        let text = String::from_utf8(render_tsv(&header, &rows).unwrap()).unwrap();
        assert_eq!(text, "Ticker\tPrice\nBTC\t1.5\n\nETH\t2\n");
    }

    #[test]
    fn test_write_and_read_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.csv");
        let header = strings(&["Ticker", "Price"]);
        let rows = vec![strings(&["BTC", "1.5"]), Vec::new(), strings(&["ETH", "N/A"])];

        write_tsv(&path, &header, &rows).unwrap();
        assert!(!temp_path(&path).exists());

        let read = read_tsv(&path).unwrap();
        assert_eq!(read, vec![strings(&["BTC", "1.5"]), strings(&["ETH", "N/A"])]);
    }
}
