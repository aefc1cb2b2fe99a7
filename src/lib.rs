//! Crypto Price Reports
//!
//! One-shot reports over cryptocurrency exchange REST APIs, written to
//! tab-delimited files for manual review.
//!
//! # Exchange API Libraries
//!
//! Blocking clients behind the [`exchange::Exchange`] trait:
//! - **Binance** and **MEXC**: v3 spot API (shared client, different hosts)
//! - **Bybit**: v5 API, unified trading account
//! - **Bitget**: v2 spot API, passphrase-protected keys
//!
//! Price tables need no credentials; balances and trade history do.
//!
//! ## Example (price lookup)
//! ```no_run
//! use crypto_price_reports::exchange::{connect, ExchangeKind};
//! use crypto_price_reports::pricing::{lookup, PriceSource};
//! use crypto_price_reports::Ticker;
//!
//! fn main() -> anyhow::Result<()> {
//!     let bybit = connect(ExchangeKind::Bybit, None)?;
//!     let sources = vec![PriceSource::new(ExchangeKind::Bybit, bybit.fetch_prices()?)];
//!     let btc = Ticker::parse("btc").unwrap();
//!     println!("{:?}", lookup(&btc, &sources));
//!     Ok(())
//! }
//! ```

pub mod binance;
pub mod bitget;
pub mod bybit;
pub mod common;
pub mod config;
pub mod data;
pub mod error;
pub mod exchange;
pub mod history;
pub mod mexc;
pub mod pricing;
pub mod tracker;
pub mod types;
pub mod valuation;

pub use config::Account;
pub use error::{ExchangeError, ExchangeResult};
pub use exchange::{Exchange, ExchangeKind};
pub use pricing::{PriceLookup, PriceSource, PriceTable};
pub use types::*;
