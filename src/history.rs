//! Historical price lookups
//!
//! The price-difference report asks for a pair's price at a past instant.
//! Bybit publishes no such endpoint for spot. [`HttpHistory`] queries a
//! `historical-prices` path and treats anything but a `{"price": ...}` body
//! as "no price". Point the base URL at a compatible service to get real data.

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::common::{build_client, endpoint_url, send, RequestPacer};
use crate::data::parse_decimal;
use crate::error::{ExchangeError, ExchangeResult};
use crate::{QuoteAsset, Ticker};

/// Default base URL of the historical price service
pub const HISTORY_API_BASE: &str = "https://api.bybit.com";

const HISTORY_PATH: &str = "/v5/market/historical-prices";

/// Source of a pair's price at a given instant
pub trait HistoricalPriceSource {
    /// Price of `pair` (e.g. "BTCUSDT") at `at`, or `None` if unknown
    fn price_at(&self, pair: &str, at: DateTime<Utc>) -> Option<Decimal>;
}

/// Price of `ticker` at `at`, trying the USDT pair then the BUSD pair
pub fn ticker_price_at(
    source: &dyn HistoricalPriceSource,
    ticker: &Ticker,
    at: DateTime<Utc>,
) -> Option<Decimal> {
    QuoteAsset::PRIORITY
        .into_iter()
        .find_map(|quote| source.price_at(&ticker.pair(quote), at))
}

#[derive(Debug, Deserialize)]
struct HistoricalPrice {
    price: serde_json::Value,
}

/// Extract the `price` field of a response body
pub fn parse_historical_price(body: &str) -> ExchangeResult<Decimal> {
    let response: HistoricalPrice = serde_json::from_str(body)?;
    match &response.price {
        serde_json::Value::String(s) => Ok(parse_decimal(s)?),
        serde_json::Value::Number(n) => Ok(parse_decimal(&n.to_string())?),
        other => Err(ExchangeError::Parse(format!("Unexpected price value {}", other))),
    }
}

/// HTTP historical price source (`GET {base}/v5/market/historical-prices`)
#[derive(Debug)]
pub struct HttpHistory {
    base_url: String,
    client: Client,
    pacer: RequestPacer,
}

impl HttpHistory {
    pub fn new(base_url: impl Into<String>) -> ExchangeResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            client: build_client()?,
            pacer: RequestPacer::default(),
        })
    }

    fn fetch(&self, pair: &str, at: DateTime<Utc>) -> ExchangeResult<Decimal> {
        let url = endpoint_url(
            &self.base_url,
            HISTORY_PATH,
            &[("symbol", pair.to_string()), ("timestamp", at.timestamp().to_string())],
        )?;
        self.pacer.wait();
        parse_historical_price(&send(self.client.get(url))?)
    }
}

impl HistoricalPriceSource for HttpHistory {
    fn price_at(&self, pair: &str, at: DateTime<Utc>) -> Option<Decimal> {
        match self.fetch(pair, at) {
            Ok(price) => Some(price),
            Err(e) => {
                debug!("No historical price for {} at {}: {}", pair, at, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct FixedHistory(HashMap<String, Decimal>);

    impl HistoricalPriceSource for FixedHistory {
        fn price_at(&self, pair: &str, _at: DateTime<Utc>) -> Option<Decimal> {
            self.0.get(pair).copied()
        }
    }

    #[test]
    fn test_parse_historical_price() {
        assert_eq!(parse_historical_price(r#"{"price": "42.5"}"#).unwrap(), dec!(42.5));
        assert_eq!(parse_historical_price(r#"{"price": 0.001}"#).unwrap(), dec!(0.001));
        assert!(parse_historical_price(r#"{"retCode": 10001}"#).is_err());
        assert!(parse_historical_price(r#"{"price": null}"#).is_err());
    }

    #[test]
    fn test_ticker_price_falls_back_to_busd() {
        let source = FixedHistory([("OLDBUSD".to_string(), dec!(3))].into_iter().collect());
        let at = Utc.with_ymd_and_hms(2024, 11, 1, 12, 0, 0).unwrap();

        assert_eq!(
            ticker_price_at(&source, &Ticker::parse("old").unwrap(), at),
            Some(dec!(3))
        );
        assert_eq!(ticker_price_at(&source, &Ticker::parse("new").unwrap(), at), None);
    }
}
