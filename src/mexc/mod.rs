//! MEXC spot API
//!
//! MEXC's v3 spot REST API mirrors Binance's endpoints, payloads and query
//! signing, so the Binance-style client is reused with MEXC's host and key
//! header.

use crate::binance::{SpotV3Client, SpotV3Venue};
use crate::common::Credentials;
use crate::error::ExchangeResult;
use crate::exchange::ExchangeKind;

/// Base URL for MEXC API
pub const MEXC_API_BASE: &str = "https://api.mexc.com";

/// Header carrying the API key on signed requests
pub const MEXC_API_KEY_HEADER: &str = "X-MEXC-APIKEY";

pub fn venue() -> SpotV3Venue {
    SpotV3Venue {
        kind: ExchangeKind::Mexc,
        base_url: MEXC_API_BASE.to_string(),
        api_key_header: MEXC_API_KEY_HEADER,
    }
}

/// Client for api.mexc.com
pub fn client(credentials: Option<Credentials>) -> ExchangeResult<SpotV3Client> {
    SpotV3Client::new(venue(), credentials)
}
