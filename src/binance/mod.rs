//! Binance v3 spot API client.
//! Public market data needs no API key; balances and trades are signed.

mod client;
mod types;

pub use client::{SpotV3Client, SpotV3Venue, BINANCE_API_BASE};
pub use types::*;
