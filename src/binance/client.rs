//! Blocking client for the Binance v3 spot REST API
//!
//! Public endpoints need no API key. Account endpoints are signed with
//! HMAC-SHA256 over the url-encoded query string, which must include
//! `timestamp` (and here `recvWindow`).
//!
//! # Example
//! ```no_run
//! use crypto_price_reports::binance::SpotV3Client;
//! use crypto_price_reports::exchange::Exchange;
//!
//! fn main() -> anyhow::Result<()> {
//!     let client = SpotV3Client::binance(None)?;
//!     let prices = client.fetch_prices()?;
//!     println!("{} pairs priced", prices.len());
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use tracing::debug;

use super::types::{api_error, parse_balances, parse_fills, parse_price_table, parse_symbols};
use crate::common::{
    build_client, collect_pages, endpoint_url, next_if_full, send, Credentials, RequestPacer,
    MAX_PAGES,
};
use crate::error::{ExchangeError, ExchangeResult};
use crate::exchange::{Exchange, ExchangeKind};
use crate::pricing::PriceTable;
use crate::{Balances, Fill};

/// Base URL for Binance API
pub const BINANCE_API_BASE: &str = "https://api.binance.com";

/// Header carrying the API key on signed requests
pub const BINANCE_API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Validity window for signed requests (ms)
const RECV_WINDOW_MS: u64 = 5000;

/// Maximum trades returned per `myTrades` call
const MY_TRADES_LIMIT: u32 = 1000;

/// Host and key header of a venue exposing the Binance v3 spot API
#[derive(Debug, Clone)]
pub struct SpotV3Venue {
    pub kind: ExchangeKind,
    pub base_url: String,
    pub api_key_header: &'static str,
}

impl SpotV3Venue {
    pub fn binance() -> Self {
        Self {
            kind: ExchangeKind::Binance,
            base_url: BINANCE_API_BASE.to_string(),
            api_key_header: BINANCE_API_KEY_HEADER,
        }
    }
}

/// Binance-style v3 spot client
#[derive(Debug)]
pub struct SpotV3Client {
    venue: SpotV3Venue,
    client: Client,
    credentials: Option<Credentials>,
    pacer: RequestPacer,
}

impl SpotV3Client {
    pub fn new(venue: SpotV3Venue, credentials: Option<Credentials>) -> ExchangeResult<Self> {
        Ok(Self {
            venue,
            client: build_client()?,
            credentials,
            pacer: RequestPacer::default(),
        })
    }

    /// Client for api.binance.com
    pub fn binance(credentials: Option<Credentials>) -> ExchangeResult<Self> {
        Self::new(SpotV3Venue::binance(), credentials)
    }

    fn public_get(&self, path: &str, params: &[(&str, String)]) -> ExchangeResult<String> {
        let url = endpoint_url(&self.venue.base_url, path, params)?;
        debug!("{} GET {}", self.venue.kind, url);
        self.pacer.wait();
        send(self.client.get(url)).map_err(api_error)
    }

    fn signed_get(&self, path: &str, params: &[(&str, String)]) -> ExchangeResult<String> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::Credentials(format!("{} account call requires API keys", self.venue.kind))
        })?;

        let mut all_params = params.to_vec();
        all_params.push(("recvWindow", RECV_WINDOW_MS.to_string()));
        all_params.push(("timestamp", Utc::now().timestamp_millis().to_string()));

        let mut url = endpoint_url(&self.venue.base_url, path, &all_params)?;
        let signature = credentials.sign_hex(url.query().unwrap_or_default());
        url.query_pairs_mut().append_pair("signature", &signature);

        debug!("{} signed GET {}{}", self.venue.kind, self.venue.base_url, path);
        self.pacer.wait();
        send(
            self.client
                .get(url)
                .header(self.venue.api_key_header, credentials.api_key()),
        )
        .map_err(api_error)
    }
}

impl Exchange for SpotV3Client {
    fn kind(&self) -> ExchangeKind {
        self.venue.kind
    }

    fn fetch_prices(&self) -> ExchangeResult<PriceTable> {
        parse_price_table(&self.public_get("/api/v3/ticker/price", &[])?)
    }

    fn fetch_balances(&self) -> ExchangeResult<Balances> {
        parse_balances(&self.signed_get("/api/v3/account", &[])?)
    }

    fn list_symbols(&self) -> ExchangeResult<Vec<String>> {
        parse_symbols(&self.public_get("/api/v3/exchangeInfo", &[])?)
    }

    /// First page starts at `since`; a full page continues with `fromId`.
    fn fetch_fills(&self, symbol: &str, since: DateTime<Utc>) -> ExchangeResult<Vec<Fill>> {
        collect_pages(MAX_PAGES, |from_id: Option<&i64>| {
            let mut params = vec![
                ("symbol", symbol.to_string()),
                ("limit", MY_TRADES_LIMIT.to_string()),
            ];
            match from_id {
                Some(id) => params.push(("fromId", id.to_string())),
                None => params.push(("startTime", since.timestamp_millis().to_string())),
            }

            let (fills, next_id) = parse_fills(&self.signed_get("/api/v3/myTrades", &params)?)?;
            let next = next_if_full(fills.len(), MY_TRADES_LIMIT as usize, next_id);
            Ok((fills, next))
        })
    }
}
