//! Price lookup across one or more pre-fetched price tables
//!
//! Every report resolves a ticker the same way: USDT pair on the first source,
//! BUSD pair on the first source, then the same two pairs on each following
//! source. Lookups are pure; fetching the tables is the caller's job.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::exchange::ExchangeKind;
use crate::{QuoteAsset, Ticker};

/// Last-traded prices keyed by exchange pair symbol (e.g. "BTCUSDT")
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    prices: HashMap<String, Decimal>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, price: Decimal) {
        self.prices.insert(symbol.into(), price);
    }

    pub fn get(&self, symbol: &str) -> Option<Decimal> {
        self.prices.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(String, Decimal)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        PriceTable {
            prices: iter.into_iter().collect(),
        }
    }
}

/// A price table tagged with the exchange it came from
#[derive(Debug, Clone)]
pub struct PriceSource {
    pub exchange: ExchangeKind,
    pub table: PriceTable,
}

impl PriceSource {
    pub fn new(exchange: ExchangeKind, table: PriceTable) -> Self {
        Self { exchange, table }
    }
}

/// Why a ticker could not be priced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpricedReason {
    /// None of the sources lists a USDT or BUSD pair for the ticker
    NoMatchingPair,
    /// The account's exchange does not list the currency's USDT pair
    PairNotListed,
}

impl std::fmt::Display for UnpricedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnpricedReason::NoMatchingPair => write!(f, "no USDT/BUSD pair on any source"),
            UnpricedReason::PairNotListed => write!(f, "no USDT pair listed"),
        }
    }
}

/// Outcome of a fallback lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceLookup {
    Found {
        exchange: ExchangeKind,
        pair: String,
        price: Decimal,
    },
    Unavailable {
        reason: UnpricedReason,
    },
}

impl PriceLookup {
    pub fn price(&self) -> Option<Decimal> {
        match self {
            PriceLookup::Found { price, .. } => Some(*price),
            PriceLookup::Unavailable { .. } => None,
        }
    }
}

/// Resolve `ticker` against `sources` in priority order
pub fn lookup(ticker: &Ticker, sources: &[PriceSource]) -> PriceLookup {
    for source in sources {
        for quote in QuoteAsset::PRIORITY {
            let pair = ticker.pair(quote);
            if let Some(price) = source.table.get(&pair) {
                return PriceLookup::Found {
                    exchange: source.exchange,
                    pair,
                    price,
                };
            }
        }
    }

    PriceLookup::Unavailable {
        reason: UnpricedReason::NoMatchingPair,
    }
}
