//! Blocking client for the Bitget v2 spot REST API
//!
//! Signed requests carry `ACCESS-KEY`, `ACCESS-SIGN`, `ACCESS-TIMESTAMP` and
//! `ACCESS-PASSPHRASE`. The signature is the base64 HMAC-SHA256 of
//! `timestamp + METHOD + request_path [+ "?" + query]`.

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use tracing::debug;

use super::types::{parse_balances, parse_fills, parse_price_table, parse_symbols};
use crate::common::{
    build_client, collect_pages, endpoint_url, next_if_full, send, Credentials, RequestPacer,
    MAX_PAGES,
};
use crate::error::{ExchangeError, ExchangeResult};
use crate::exchange::{Exchange, ExchangeKind};
use crate::pricing::PriceTable;
use crate::{Balances, Fill};

/// Base URL for Bitget API
pub const BITGET_API_BASE: &str = "https://api.bitget.com";

/// Page size for fill history
const FILLS_LIMIT: u32 = 100;

/// Build the string Bitget signs for a GET request
pub fn signature_payload(timestamp: i64, path: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(query) => format!("{}GET{}?{}", timestamp, path, query),
        None => format!("{}GET{}", timestamp, path),
    }
}

#[derive(Debug)]
pub struct BitgetClient {
    base_url: String,
    client: Client,
    credentials: Option<Credentials>,
    pacer: RequestPacer,
}

impl BitgetClient {
    pub fn new(credentials: Option<Credentials>) -> ExchangeResult<Self> {
        Ok(Self {
            base_url: BITGET_API_BASE.to_string(),
            client: build_client()?,
            credentials,
            pacer: RequestPacer::default(),
        })
    }

    fn public_get(&self, path: &str, params: &[(&str, String)]) -> ExchangeResult<String> {
        let url = endpoint_url(&self.base_url, path, params)?;
        debug!("bitget GET {}", url);
        self.pacer.wait();
        send(self.client.get(url))
    }

    fn signed_get(&self, path: &str, params: &[(&str, String)]) -> ExchangeResult<String> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::Credentials("bitget account call requires API keys".to_string())
        })?;
        let passphrase = credentials.password().ok_or_else(|| {
            ExchangeError::Credentials("bitget API keys require a 'password' passphrase".to_string())
        })?;

        let url = endpoint_url(&self.base_url, path, params)?;
        let timestamp = Utc::now().timestamp_millis();
        let signature = credentials.sign_base64(&signature_payload(timestamp, path, url.query()));

        debug!("bitget signed GET {}{}", self.base_url, path);
        self.pacer.wait();
        send(
            self.client
                .get(url)
                .header("ACCESS-KEY", credentials.api_key())
                .header("ACCESS-SIGN", signature)
                .header("ACCESS-TIMESTAMP", timestamp.to_string())
                .header("ACCESS-PASSPHRASE", passphrase)
                .header("locale", "en-US"),
        )
    }
}

impl Exchange for BitgetClient {
    fn kind(&self) -> ExchangeKind {
        ExchangeKind::Bitget
    }

    fn fetch_prices(&self) -> ExchangeResult<PriceTable> {
        parse_price_table(&self.public_get("/api/v2/spot/market/tickers", &[])?)
    }

    fn fetch_balances(&self) -> ExchangeResult<Balances> {
        parse_balances(&self.signed_get("/api/v2/spot/account/assets", &[])?)
    }

    fn list_symbols(&self) -> ExchangeResult<Vec<String>> {
        parse_symbols(&self.public_get("/api/v2/spot/public/symbols", &[])?)
    }

    /// Pages run newest to oldest; a full page continues below its oldest trade id.
    fn fetch_fills(&self, symbol: &str, since: DateTime<Utc>) -> ExchangeResult<Vec<Fill>> {
        collect_pages(MAX_PAGES, |id_less_than: Option<&String>| {
            let mut params = vec![
                ("symbol", symbol.to_string()),
                ("startTime", since.timestamp_millis().to_string()),
                ("limit", FILLS_LIMIT.to_string()),
            ];
            if let Some(id) = id_less_than {
                params.push(("idLessThan", id.clone()));
            }

            let (fills, oldest_id) =
                parse_fills(&self.signed_get("/api/v2/spot/trade/fills", &params)?)?;
            let next = next_if_full(fills.len(), FILLS_LIMIT as usize, oldest_id);
            Ok((fills, next))
        })
    }
}
