//! Integration tests for the crypto-price-reports system
//!
//! These tests verify that parsing, pricing, tracking and valuation work
//! together correctly. No network calls are made.

use chrono::{Duration, NaiveDate, Utc};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs;

use crypto_price_reports::data::{self, load_ticker_list};
use crypto_price_reports::pricing::{lookup, UnpricedReason};
use crypto_price_reports::tracker::{self, DayState};
use crypto_price_reports::valuation::{trade_window_start, value_balances, within_window};
use crypto_price_reports::{
    binance, bybit, config, ExchangeKind, Fill, PriceLookup, PriceSource, PriceTable, Ticker,
};

// =============================================================================
// Test Utilities
// =============================================================================

fn source(exchange: ExchangeKind, entries: &[(&str, Decimal)]) -> PriceSource {
    let table: PriceTable = entries.iter().map(|(s, p)| (s.to_string(), *p)).collect();
    PriceSource::new(exchange, table)
}

fn run_tracker(
    dir: &std::path::Path,
    today: NaiveDate,
    prices: &[(&str, Decimal)],
) -> Vec<Vec<String>> {
    let lines = load_ticker_list(dir.join("crypto_tickers.txt")).unwrap();
    let output = dir.join("fetch_crypto_prices.csv");
    let marker = dir.join("lastrundate.txt");

    let last_run = tracker::read_marker(&marker).unwrap();
    let state = DayState::from_marker(last_run.as_deref(), today);
    let previous = tracker::load_records(&output).unwrap();
    let entries = tracker::track(&lines, &[source(ExchangeKind::Mexc, prices)], &previous, state);
    tracker::save_entries(&output, today, &entries).unwrap();
    tracker::write_marker(&marker, today).unwrap();

    entries.iter().map(|e| e.to_row()).collect()
}

// =============================================================================
// Price Lookup
// =============================================================================

#[test]
fn test_fallback_order_across_sources() {
    let sources = vec![
        source(ExchangeKind::Bybit, &[("AAABUSD", dec!(2)), ("BBBUSDT", dec!(3))]),
        source(
            ExchangeKind::Mexc,
            &[("AAAUSDT", dec!(9)), ("CCCUSDT", dec!(4)), ("DDDBUSD", dec!(5))],
        ),
    ];

    let price = |t: &str| lookup(&Ticker::parse(t).unwrap(), &sources).price();
    assert_eq!(price("aaa"), Some(dec!(2)));
    assert_eq!(price("bbb"), Some(dec!(3)));
    assert_eq!(price("ccc"), Some(dec!(4)));
    assert_eq!(price("ddd"), Some(dec!(5)));
    assert_eq!(
        lookup(&Ticker::parse("eee").unwrap(), &sources),
        PriceLookup::Unavailable {
            reason: UnpricedReason::NoMatchingPair
        }
    );
}

#[test]
fn test_lookup_on_parsed_exchange_tables() {
    let bybit_body = r#"{"retCode": 0, "retMsg": "OK", "result": {"category": "spot", "list": [
        {"symbol": "BTCUSDT", "lastPrice": "60000.5"}
    ]}, "retExtInfo": {}, "time": 1}"#;
    let mexc_body = r#"[{"symbol": "KASUSDT", "price": "0.1234"}]"#;

    let sources = vec![
        PriceSource::new(ExchangeKind::Bybit, bybit::parse_price_table(bybit_body).unwrap()),
        PriceSource::new(ExchangeKind::Mexc, binance::parse_price_table(mexc_body).unwrap()),
    ];

    match lookup(&Ticker::parse("kas").unwrap(), &sources) {
        PriceLookup::Found {
            exchange,
            pair,
            price,
        } => {
            assert_eq!(exchange, ExchangeKind::Mexc);
            assert_eq!(pair, "KASUSDT");
            assert_eq!(price, dec!(0.1234));
        }
        other => panic!("expected a price, got {:?}", other),
    }
}

// =============================================================================
// Tracker
// =============================================================================

#[test]
fn test_tracker_runs_across_days() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("crypto_tickers.txt"), "btc\n\nmissing\n").unwrap();
    let day1 = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let day2 = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();

    let first = run_tracker(dir.path(), day1, &[("BTCUSDT", dec!(100))]);
    assert_eq!(
        first[0],
        vec!["BTC", "N/A", "100.000000", "100.000000", "100.000000", "0.00", "N/A"]
    );
    assert!(first[1].is_empty());
    assert_eq!(first[2][1..], vec!["N/A"; 6][..]);

    let rerun = run_tracker(dir.path(), day1, &[("BTCUSDT", dec!(110))]);
    assert_eq!(rerun[0][2], "100.000000");
    assert_eq!(rerun[0][3], "100.000000");
    assert_eq!(rerun[0][4], "110.000000");
    assert_eq!(rerun[0][5], "10.00");

    let next_day = run_tracker(dir.path(), day2, &[("BTCUSDT", dec!(121))]);
    assert_eq!(
        next_day[0],
        vec!["BTC", "100.000000", "121.000000", "110.000000", "121.000000", "10.00", "21.00"]
    );

    let written = fs::read_to_string(dir.path().join("fetch_crypto_prices.csv")).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with("CurrYestPriceDiff\t2024-06-02"));
    assert_eq!(lines[2], "");
    assert_eq!(
        fs::read_to_string(dir.path().join("lastrundate.txt")).unwrap(),
        "2024-06-02"
    );
}

#[test]
fn test_output_rows_match_input_lines() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("crypto_tickers.txt"), "\nbtc\n\n\neth\n").unwrap();

    let rows = run_tracker(dir.path(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), &[]);
    assert_eq!(rows.len(), 5);
    let blanks: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_empty())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(blanks, vec![0, 2, 3]);
}

// =============================================================================
// Valuation and Trade Window
// =============================================================================

#[test]
fn test_valuation_from_binance_account() {
    let body = r#"{"canTrade": true, "balances": [
        {"asset": "BTC", "free": "0.40000000", "locked": "0.10000000"},
        {"asset": "NOPAIR", "free": "12.00000000", "locked": "0.00000000"},
        {"asset": "ETH", "free": "0.00000000", "locked": "0.00000000"}
    ]}"#;
    let balances = binance::parse_balances(body).unwrap();
    let prices: PriceTable = [("BTCUSDT".to_string(), dec!(60000))].into_iter().collect();

    let valuation = value_balances(&balances, &prices);

    assert_eq!(valuation.total, dec!(30000));
    assert_eq!(valuation.holdings.len(), 2);
    assert_eq!(valuation.unpriced().count(), 1);
}

#[test]
fn test_fill_exactly_seven_days_old_is_included() {
    let now = Utc::now();
    let fill = Fill {
        symbol: "BTCUSDT".to_string(),
        side: None,
        price: dec!(1),
        amount: dec!(1),
        timestamp: now - Duration::hours(7 * 24),
    };
    assert!(within_window(&fill, trade_window_start(now)));
}

// =============================================================================
// Configuration and Files
// =============================================================================

#[test]
fn test_load_accounts_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("api_keys.json");
    fs::write(
        &path,
        r#"{"mexc": {"apiKey": "k", "secret": "s"},
            "bybit": {"main": {"apiKey": "k1", "secret": "s1"}, "sub": {"apiKey": "k2", "secret": "s2"}}}"#,
    )
    .unwrap();

    let accounts = config::load_accounts(&path).unwrap();
    let bybit: Vec<&str> = accounts
        .iter()
        .filter(|a| a.exchange == ExchangeKind::Bybit)
        .map(|a| a.label.as_str())
        .collect();
    assert_eq!(bybit, vec!["main", "sub"]);
    assert!(accounts.iter().any(|a| a.exchange == ExchangeKind::Mexc));
}

#[test]
fn test_missing_ticker_list_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_ticker_list(dir.path().join("absent.txt")).is_err());
}

#[test]
fn test_write_tsv_replaces_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let header = vec!["Price".to_string()];

    data::write_tsv(&path, &header, &[vec!["1".to_string()], vec![], vec!["2".to_string()]]).unwrap();
    data::write_tsv(&path, &header, &[vec!["3".to_string()]]).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "Price\n3\n");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}
