//! Blocking client for the Bybit v5 REST API (spot category)
//!
//! Signed GET requests carry `X-BAPI-API-KEY`, `X-BAPI-TIMESTAMP`,
//! `X-BAPI-RECV-WINDOW` and `X-BAPI-SIGN`, where the signature is the hex
//! HMAC-SHA256 of `timestamp + api_key + recv_window + query_string`.

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use tracing::debug;

use super::types::{parse_balances, parse_fills, parse_price_table, parse_symbols};
use crate::common::{
    build_client, collect_pages, endpoint_url, send, Credentials, RequestPacer, MAX_PAGES,
};
use crate::error::{ExchangeError, ExchangeResult};
use crate::exchange::{Exchange, ExchangeKind};
use crate::pricing::PriceTable;
use crate::{Balances, Fill};

/// Base URL for Bybit API
pub const BYBIT_API_BASE: &str = "https://api.bybit.com";

/// Validity window for signed requests (ms)
const RECV_WINDOW_MS: u64 = 5000;

/// Page size for execution history
const EXECUTION_PAGE_LIMIT: u32 = 100;

/// Wallet queried for balances
const ACCOUNT_TYPE: &str = "UNIFIED";

/// Build the string Bybit signs for a GET request
pub fn signature_payload(timestamp: i64, api_key: &str, recv_window: u64, query: &str) -> String {
    format!("{}{}{}{}", timestamp, api_key, recv_window, query)
}

#[derive(Debug)]
pub struct BybitClient {
    base_url: String,
    client: Client,
    credentials: Option<Credentials>,
    pacer: RequestPacer,
}

impl BybitClient {
    pub fn new(credentials: Option<Credentials>) -> ExchangeResult<Self> {
        Self::with_base_url(BYBIT_API_BASE, credentials)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> ExchangeResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            client: build_client()?,
            credentials,
            pacer: RequestPacer::default(),
        })
    }

    fn public_get(&self, path: &str, params: &[(&str, String)]) -> ExchangeResult<String> {
        let url = endpoint_url(&self.base_url, path, params)?;
        debug!("bybit GET {}", url);
        self.pacer.wait();
        send(self.client.get(url))
    }

    fn signed_get(&self, path: &str, params: &[(&str, String)]) -> ExchangeResult<String> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::Credentials("bybit account call requires API keys".to_string())
        })?;

        let url = endpoint_url(&self.base_url, path, params)?;
        let timestamp = Utc::now().timestamp_millis();
        let payload = signature_payload(
            timestamp,
            credentials.api_key(),
            RECV_WINDOW_MS,
            url.query().unwrap_or_default(),
        );
        let signature = credentials.sign_hex(&payload);

        debug!("bybit signed GET {}{}", self.base_url, path);
        self.pacer.wait();
        send(
            self.client
                .get(url)
                .header("X-BAPI-API-KEY", credentials.api_key())
                .header("X-BAPI-TIMESTAMP", timestamp.to_string())
                .header("X-BAPI-RECV-WINDOW", RECV_WINDOW_MS.to_string())
                .header("X-BAPI-SIGN", signature),
        )
    }
}

impl Exchange for BybitClient {
    fn kind(&self) -> ExchangeKind {
        ExchangeKind::Bybit
    }

    fn fetch_prices(&self) -> ExchangeResult<PriceTable> {
        let body = self.public_get("/v5/market/tickers", &[("category", "spot".to_string())])?;
        parse_price_table(&body)
    }

    fn fetch_balances(&self) -> ExchangeResult<Balances> {
        let body = self.signed_get(
            "/v5/account/wallet-balance",
            &[("accountType", ACCOUNT_TYPE.to_string())],
        )?;
        parse_balances(&body)
    }

    fn list_symbols(&self) -> ExchangeResult<Vec<String>> {
        let body = self.public_get(
            "/v5/market/instruments-info",
            &[("category", "spot".to_string())],
        )?;
        parse_symbols(&body)
    }

    fn fetch_fills(&self, symbol: &str, since: DateTime<Utc>) -> ExchangeResult<Vec<Fill>> {
        collect_pages(MAX_PAGES, |cursor: Option<&String>| {
            let mut params = vec![
                ("category", "spot".to_string()),
                ("symbol", symbol.to_string()),
                ("startTime", since.timestamp_millis().to_string()),
                ("limit", EXECUTION_PAGE_LIMIT.to_string()),
            ];
            if let Some(c) = cursor {
                params.push(("cursor", c.clone()));
            }

            parse_fills(&self.signed_get("/v5/execution/list", &params)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_payload_order() {
        assert_eq!(
            signature_payload(1658384314791, "XXXXXXXXXX", 5000, "category=option&symbol=BTC-29JUL22-25000-C"),
            "1658384314791XXXXXXXXXX5000category=option&symbol=BTC-29JUL22-25000-C"
        );
    }

    #[test]
    fn test_signed_call_without_credentials() {
        let client = BybitClient::new(None).unwrap();
        assert!(matches!(
            client.fetch_fills("BTCUSDT", Utc::now()),
            Err(ExchangeError::Credentials(_))
        ));
    }
}
