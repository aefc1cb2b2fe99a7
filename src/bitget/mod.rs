//! Bitget v2 spot API client

mod client;
mod types;

pub use client::{signature_payload, BitgetClient, BITGET_API_BASE};
pub use types::*;
