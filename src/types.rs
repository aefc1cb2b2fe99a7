//! Core data types shared by every report

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base asset symbol (e.g. "BTC"), always trimmed and uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Normalize a raw input line into a ticker. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Ticker(trimmed.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trading pair against the given quote asset (e.g. BTC + USDT -> BTCUSDT)
    pub fn pair(&self, quote: QuoteAsset) -> String {
        format!("{}{}", self.0, quote.as_str())
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stablecoin quote assets, in lookup priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteAsset {
    Usdt,
    Busd,
}

impl QuoteAsset {
    /// USDT first, BUSD as fallback
    pub const PRIORITY: [QuoteAsset; 2] = [QuoteAsset::Usdt, QuoteAsset::Busd];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteAsset::Usdt => "USDT",
            QuoteAsset::Busd => "BUSD",
        }
    }
}

/// One line of a ticker list file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerLine {
    Blank,
    Symbol(Ticker),
}

impl TickerLine {
    pub fn parse(raw: &str) -> Self {
        match Ticker::parse(raw) {
            Some(ticker) => TickerLine::Symbol(ticker),
            None => TickerLine::Blank,
        }
    }

    pub fn ticker(&self) -> Option<&Ticker> {
        match self {
            TickerLine::Blank => None,
            TickerLine::Symbol(ticker) => Some(ticker),
        }
    }
}

/// Account balances: currency -> total held amount
pub type Balances = BTreeMap<String, Decimal>;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Parse exchange side strings ("BUY", "Sell", "buy")
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "buy" => Some(Side::Buy),
            "sell" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// A single executed fill from an account's trade history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub symbol: String,
    pub side: Option<Side>,
    pub price: Decimal,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_normalization() {
        assert_eq!(Ticker::parse("  btc \n").unwrap().as_str(), "BTC");
        assert!(Ticker::parse("   ").is_none());
        assert!(Ticker::parse("").is_none());
    }

    #[test]
    fn test_pair_formatting() {
        let ticker = Ticker::parse("eth").unwrap();
        assert_eq!(ticker.pair(QuoteAsset::Usdt), "ETHUSDT");
        assert_eq!(ticker.pair(QuoteAsset::Busd), "ETHBUSD");
    }

    #[test]
    fn test_ticker_line() {
        assert_eq!(TickerLine::parse(""), TickerLine::Blank);
        assert_eq!(
            TickerLine::parse("sol").ticker().map(Ticker::as_str),
            Some("SOL")
        );
    }

    #[test]
    fn test_side_parse() {
        assert_eq!(Side::parse("BUY"), Some(Side::Buy));
        assert_eq!(Side::parse("Sell"), Some(Side::Sell));
        assert_eq!(Side::parse("unknown"), None);
    }
}
