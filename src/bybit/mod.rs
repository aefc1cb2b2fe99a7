//! Bybit v5 API client (spot market data, unified wallet, execution history)

mod client;
mod types;

pub use client::{signature_payload, BybitClient, BYBIT_API_BASE};
pub use types::*;
