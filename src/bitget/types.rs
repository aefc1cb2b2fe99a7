//! Bitget v2 spot API types
//!
//! Responses are wrapped in `{code, msg, data}` with `code == "00000"` on
//! success.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use crate::data::parse_decimal;
use crate::error::{ExchangeError, ExchangeResult};
use crate::pricing::PriceTable;
use crate::{Balances, Fill, Side};

/// Success code of every Bitget response
pub const SUCCESS_CODE: &str = "00000";

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Decode an envelope and type its `data`
pub fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> ExchangeResult<T> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if envelope.code != SUCCESS_CODE {
        return Err(ExchangeError::Api {
            code: envelope.code,
            message: envelope.msg,
        });
    }
    Ok(serde_json::from_value(envelope.data)?)
}

/// Entry of `GET /api/v2/spot/market/tickers`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,
    pub last_pr: String,
}

/// Entry of `GET /api/v2/spot/public/symbols`
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub status: String,
}

/// Entry of `GET /api/v2/spot/account/assets`
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub coin: String,
    #[serde(default)]
    pub available: Option<String>,
    #[serde(default)]
    pub frozen: Option<String>,
    #[serde(default)]
    pub locked: Option<String>,
}

impl Asset {
    /// available + frozen + locked
    pub fn total(&self) -> ExchangeResult<rust_decimal::Decimal> {
        let mut total = rust_decimal::Decimal::ZERO;
        for part in [&self.available, &self.frozen, &self.locked].into_iter().flatten() {
            if !part.trim().is_empty() {
                total += parse_decimal(part)?;
            }
        }
        Ok(total)
    }
}

/// Entry of `GET /api/v2/spot/trade/fills`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeFill {
    pub symbol: String,
    pub trade_id: String,
    #[serde(default)]
    pub side: String,
    pub price_avg: String,
    pub size: String,
    pub c_time: String,
}

pub fn parse_price_table(body: &str) -> ExchangeResult<PriceTable> {
    let tickers: Vec<Ticker> = unwrap_envelope(body)?;
    Ok(tickers
        .into_iter()
        .filter_map(|t| match parse_decimal(&t.last_pr) {
            Ok(price) => Some((t.symbol, price)),
            Err(e) => {
                warn!("Skipping {} with unparsable price {:?}: {}", t.symbol, t.last_pr, e);
                None
            }
        })
        .collect())
}

pub fn parse_symbols(body: &str) -> ExchangeResult<Vec<String>> {
    let symbols: Vec<SymbolInfo> = unwrap_envelope(body)?;
    Ok(symbols
        .into_iter()
        .filter(|s| s.status == "online")
        .map(|s| s.symbol)
        .collect())
}

pub fn parse_balances(body: &str) -> ExchangeResult<Balances> {
    let assets: Vec<Asset> = unwrap_envelope(body)?;
    let mut balances = Balances::new();
    for asset in assets {
        let total = asset.total()?;
        if !total.is_zero() {
            balances.insert(asset.coin.to_uppercase(), total);
        }
    }
    Ok(balances)
}

/// Fills of one page plus the oldest trade id, used as `idLessThan` for the next
pub fn parse_fills(body: &str) -> ExchangeResult<(Vec<Fill>, Option<String>)> {
    let fills: Vec<TradeFill> = unwrap_envelope(body)?;
    let oldest_id = fills
        .iter()
        .filter_map(|f| f.trade_id.parse::<u64>().ok())
        .min()
        .map(|id| id.to_string());

    let fills = fills
        .into_iter()
        .map(|f| -> ExchangeResult<Fill> {
            let millis: i64 = f
                .c_time
                .parse()
                .map_err(|_| ExchangeError::Parse(format!("Invalid cTime {:?}", f.c_time)))?;
            Ok(Fill {
                timestamp: DateTime::from_timestamp_millis(millis)
                    .ok_or_else(|| ExchangeError::Parse(format!("Invalid cTime {}", millis)))?,
                side: Side::parse(&f.side),
                price: parse_decimal(&f.price_avg)?,
                amount: parse_decimal(&f.size)?,
                symbol: f.symbol,
            })
        })
        .collect::<ExchangeResult<Vec<Fill>>>()?;
    Ok((fills, oldest_id))
}
