//! Binance v3 spot API types
//!
//! MEXC's v3 spot API returns the same shapes, so these types serve both.

use chrono::DateTime;
use serde::Deserialize;
use tracing::warn;

use crate::data::parse_decimal;
use crate::error::{ExchangeError, ExchangeResult};
use crate::pricing::PriceTable;
use crate::{Balances, Fill, Side};

/// Entry of `GET /api/v3/ticker/price`
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: String,
}

/// `GET /api/v3/exchangeInfo`
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub is_spot_trading_allowed: Option<bool>,
}

impl SymbolInfo {
    /// Binance reports "TRADING"; MEXC reports "1" or "ENABLED"
    pub fn is_tradable(&self) -> bool {
        matches!(self.status.as_str(), "TRADING" | "ENABLED" | "1")
            && self.is_spot_trading_allowed.unwrap_or(true)
    }
}

/// `GET /api/v3/account`
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub balances: Vec<AssetBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

/// Entry of `GET /api/v3/myTrades`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyTrade {
    pub symbol: String,
    pub id: i64,
    pub price: String,
    pub qty: String,
    pub time: i64,
    #[serde(default)]
    pub is_buyer: Option<bool>,
}

/// Error body returned with non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: i64,
    pub msg: String,
}

/// Turn a non-2xx response into an API error when the body carries one
pub fn api_error(err: ExchangeError) -> ExchangeError {
    match err {
        ExchangeError::Status { status, body } => match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => ExchangeError::Api {
                code: parsed.code.to_string(),
                message: parsed.msg,
            },
            Err(_) => ExchangeError::Status { status, body },
        },
        other => other,
    }
}

pub fn parse_price_table(body: &str) -> ExchangeResult<PriceTable> {
    let tickers: Vec<TickerPrice> = serde_json::from_str(body)?;
    Ok(tickers
        .into_iter()
        .filter_map(|t| match parse_decimal(&t.price) {
            Ok(price) => Some((t.symbol, price)),
            Err(e) => {
                warn!("Skipping {} with unparsable price {:?}: {}", t.symbol, t.price, e);
                None
            }
        })
        .collect())
}

pub fn parse_symbols(body: &str) -> ExchangeResult<Vec<String>> {
    let info: ExchangeInfo = serde_json::from_str(body)?;
    Ok(info
        .symbols
        .into_iter()
        .filter(SymbolInfo::is_tradable)
        .map(|s| s.symbol)
        .collect())
}

/// Balances with `free + locked`, zero totals dropped
pub fn parse_balances(body: &str) -> ExchangeResult<Balances> {
    let account: Account = serde_json::from_str(body)?;
    let mut balances = Balances::new();
    for entry in account.balances {
        let total = parse_decimal(&entry.free)? + parse_decimal(&entry.locked)?;
        if !total.is_zero() {
            balances.insert(entry.asset, total);
        }
    }
    Ok(balances)
}

/// Fills of one `myTrades` page plus the `fromId` that continues after it
pub fn parse_fills(body: &str) -> ExchangeResult<(Vec<Fill>, Option<i64>)> {
    let trades: Vec<MyTrade> = serde_json::from_str(body)?;
    let next_id = trades.iter().map(|t| t.id).max().map(|id| id + 1);
    let fills = trades
        .into_iter()
        .map(|t| -> ExchangeResult<Fill> {
            Ok(Fill {
                timestamp: DateTime::from_timestamp_millis(t.time)
                    .ok_or_else(|| ExchangeError::Parse(format!("Invalid trade time {}", t.time)))?,
                side: t.is_buyer.map(|b| if b { Side::Buy } else { Side::Sell }),
                price: parse_decimal(&t.price)?,
                amount: parse_decimal(&t.qty)?,
                symbol: t.symbol,
            })
        })
        .collect::<ExchangeResult<Vec<Fill>>>()?;
    Ok((fills, next_id))
}
