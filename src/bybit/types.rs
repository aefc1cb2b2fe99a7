//! Bybit v5 API types
//!
//! Every v5 response is wrapped in `{retCode, retMsg, result}`; a non-zero
//! `retCode` is an error even when the HTTP status is 200.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use crate::data::parse_decimal;
use crate::error::{ExchangeError, ExchangeResult};
use crate::pricing::PriceTable;
use crate::{Balances, Fill, Side};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    pub result: Option<T>,
}

/// Decode an envelope and unwrap its `result`
pub fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> ExchangeResult<T> {
    // Error responses may carry an empty `result`, so check the code before typing it
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(body)?;
    if envelope.ret_code != 0 {
        return Err(ExchangeError::Api {
            code: envelope.ret_code.to_string(),
            message: envelope.ret_msg,
        });
    }
    let result = envelope
        .result
        .ok_or_else(|| ExchangeError::Parse("Bybit response without result".to_string()))?;
    Ok(serde_json::from_value(result)?)
}

/// Generic `{list: [...], nextPageCursor}` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub list: Vec<T>,
    #[serde(default)]
    pub next_page_cursor: Option<String>,
}

/// Entry of `GET /v5/market/tickers?category=spot`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotTicker {
    pub symbol: String,
    pub last_price: String,
}

/// Entry of `GET /v5/market/instruments-info?category=spot`
#[derive(Debug, Clone, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    #[serde(default)]
    pub status: String,
}

/// Account entry of `GET /v5/account/wallet-balance`
#[derive(Debug, Clone, Deserialize)]
pub struct WalletAccount {
    #[serde(default)]
    pub coin: Vec<WalletCoin>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCoin {
    pub coin: String,
    #[serde(default)]
    pub wallet_balance: String,
}

/// Entry of `GET /v5/execution/list`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub symbol: String,
    #[serde(default)]
    pub side: String,
    pub exec_price: String,
    pub exec_qty: String,
    pub exec_time: String,
}

pub fn parse_price_table(body: &str) -> ExchangeResult<PriceTable> {
    let result: ListResult<SpotTicker> = unwrap_envelope(body)?;
    Ok(result
        .list
        .into_iter()
        .filter_map(|t| match parse_decimal(&t.last_price) {
            Ok(price) => Some((t.symbol, price)),
            Err(e) => {
                warn!("Skipping {} with unparsable price {:?}: {}", t.symbol, t.last_price, e);
                None
            }
        })
        .collect())
}

pub fn parse_symbols(body: &str) -> ExchangeResult<Vec<String>> {
    let result: ListResult<Instrument> = unwrap_envelope(body)?;
    Ok(result
        .list
        .into_iter()
        .filter(|i| i.status == "Trading")
        .map(|i| i.symbol)
        .collect())
}

/// Wallet balances summed across the returned accounts, zero totals dropped
pub fn parse_balances(body: &str) -> ExchangeResult<Balances> {
    let result: ListResult<WalletAccount> = unwrap_envelope(body)?;
    let mut balances = Balances::new();
    for coin in result.list.into_iter().flat_map(|a| a.coin) {
        if coin.wallet_balance.trim().is_empty() {
            continue;
        }
        let amount = parse_decimal(&coin.wallet_balance)?;
        if !amount.is_zero() {
            *balances.entry(coin.coin).or_default() += amount;
        }
    }
    Ok(balances)
}

/// One page of executions plus the cursor for the next page, if any
pub fn parse_fills(body: &str) -> ExchangeResult<(Vec<Fill>, Option<String>)> {
    let result: ListResult<Execution> = unwrap_envelope(body)?;
    let fills = result
        .list
        .into_iter()
        .map(|e| -> ExchangeResult<Fill> {
            let millis: i64 = e
                .exec_time
                .parse()
                .map_err(|_| ExchangeError::Parse(format!("Invalid execTime {:?}", e.exec_time)))?;
            Ok(Fill {
                timestamp: DateTime::from_timestamp_millis(millis)
                    .ok_or_else(|| ExchangeError::Parse(format!("Invalid execTime {}", millis)))?,
                side: Side::parse(&e.side),
                price: parse_decimal(&e.exec_price)?,
                amount: parse_decimal(&e.exec_qty)?,
                symbol: e.symbol,
            })
        })
        .collect::<ExchangeResult<Vec<Fill>>>()?;

    let cursor = result.next_page_cursor.filter(|c| !c.is_empty());
    Ok((fills, cursor))
}
