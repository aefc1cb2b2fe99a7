//! Exchange abstraction
//!
//! Every report talks to exchanges through the [`Exchange`] trait. Public
//! endpoints (price tables, symbol lists) work without credentials; account
//! endpoints return [`ExchangeError::Credentials`] when none were supplied.

use chrono::{DateTime, Utc};

use crate::binance::SpotV3Client;
use crate::bitget::BitgetClient;
use crate::bybit::BybitClient;
use crate::common::Credentials;
use crate::error::ExchangeResult;
use crate::pricing::PriceTable;
use crate::{Balances, Fill};

/// Supported exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExchangeKind {
    Binance,
    Bybit,
    Mexc,
    Bitget,
}

impl ExchangeKind {
    pub const ALL: [ExchangeKind; 4] = [
        ExchangeKind::Binance,
        ExchangeKind::Bybit,
        ExchangeKind::Mexc,
        ExchangeKind::Bitget,
    ];

    /// Lowercase name as used in the credentials file
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeKind::Binance => "binance",
            ExchangeKind::Bybit => "bybit",
            ExchangeKind::Mexc => "mexc",
            ExchangeKind::Bitget => "bitget",
        }
    }

    /// Prefix for credential environment overrides (e.g. `BYBIT_API_KEY`)
    pub fn env_prefix(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl std::str::FromStr for ExchangeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(ExchangeKind::Binance),
            "bybit" => Ok(ExchangeKind::Bybit),
            "mexc" => Ok(ExchangeKind::Mexc),
            "bitget" => Ok(ExchangeKind::Bitget),
            _ => Err(format!(
                "Unknown exchange: {}. Use 'binance', 'bybit', 'mexc' or 'bitget'",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a comma-separated exchange list, keeping order (e.g. "bybit,mexc")
pub fn parse_exchange_list(raw: &str) -> Result<Vec<ExchangeKind>, String> {
    let kinds = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect::<Result<Vec<ExchangeKind>, String>>()?;

    if kinds.is_empty() {
        return Err("At least one exchange is required".to_string());
    }
    Ok(kinds)
}

/// Spot exchange operations used by the reports
pub trait Exchange {
    fn kind(&self) -> ExchangeKind;

    /// Last-traded price for every spot pair
    fn fetch_prices(&self) -> ExchangeResult<PriceTable>;

    /// Total held amount per currency
    fn fetch_balances(&self) -> ExchangeResult<Balances>;

    /// All spot symbols currently open for trading
    fn list_symbols(&self) -> ExchangeResult<Vec<String>>;

    /// Account fills on `symbol` executed at or after `since`
    fn fetch_fills(&self, symbol: &str, since: DateTime<Utc>) -> ExchangeResult<Vec<Fill>>;
}

/// Create a client for `kind`. Without credentials only public calls succeed.
pub fn connect(
    kind: ExchangeKind,
    credentials: Option<Credentials>,
) -> ExchangeResult<Box<dyn Exchange>> {
    Ok(match kind {
        ExchangeKind::Binance => Box::new(SpotV3Client::binance(credentials)?),
        ExchangeKind::Mexc => Box::new(crate::mexc::client(credentials)?),
        ExchangeKind::Bybit => Box::new(BybitClient::new(credentials)?),
        ExchangeKind::Bitget => Box::new(BitgetClient::new(credentials)?),
    })
}
