//! Balances command - account value and last week's trades per exchange account

use anyhow::Result;
use chrono::Utc;
use crypto_price_reports::config::{self, Account};
use crypto_price_reports::exchange::{connect, ExchangeKind};
use crypto_price_reports::valuation::{fetch_recent_fills, fetch_valuation, HoldingValue, TRADE_WINDOW_DAYS};
use std::path::PathBuf;
use tracing::{error, info};

pub fn run(api_keys: PathBuf, exchanges: Option<Vec<ExchangeKind>>, skip_trades: bool) -> Result<()> {
    let path = config::resolve_api_keys_path(&api_keys);
    let mut accounts: Vec<Account> = config::load_accounts(&path)?
        .into_iter()
        .filter(|a| exchanges.as_ref().map_or(true, |only| only.contains(&a.exchange)))
        .collect();
    accounts.sort_by_key(|a| a.exchange.as_str());
    info!("Reporting on {} accounts", accounts.len());

    let mut current_exchange = None;
    for account in &accounts {
        if current_exchange != Some(account.exchange) {
            super::banner(&account.exchange.as_str().to_uppercase());
            current_exchange = Some(account.exchange);
        }
        println!("\n--- Account: {} ---", account.label);

        let exchange = match connect(account.exchange, Some(account.credentials.clone())) {
            Ok(exchange) => exchange,
            Err(e) => {
                error!("Failed to create {} client: {}", account, e);
                continue;
            }
        };

        let valuation = fetch_valuation(exchange.as_ref());
        println!("Total Value in USDT: {}", valuation.total.normalize());
        println!("Balances:");
        for holding in &valuation.holdings {
            match holding.value {
                HoldingValue::Priced { price, value } => println!(
                    "  {:<10} {:>20}  @ {:<14} = {} USDT",
                    holding.currency,
                    holding.amount.normalize(),
                    price.normalize(),
                    value.normalize()
                ),
                HoldingValue::Unpriced { reason } => println!(
                    "  {:<10} {:>20}  ({})",
                    holding.currency,
                    holding.amount.normalize(),
                    reason
                ),
            }
        }

        if skip_trades {
            continue;
        }

        let fills = fetch_recent_fills(exchange.as_ref(), Utc::now());
        println!("Trades in the last {} days ({} total):", TRADE_WINDOW_DAYS, fills.len());
        for fill in &fills {
            println!(
                "  {}  {:<12} {:<4} price={} amount={}",
                fill.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                fill.symbol,
                fill.side.map(|s| s.to_string()).unwrap_or_default(),
                fill.price.normalize(),
                fill.amount.normalize()
            );
        }
    }

    println!("\n{}", "=".repeat(60));
    Ok(())
}
