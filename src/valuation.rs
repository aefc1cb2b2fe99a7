//! Balance valuation and trade history windowing for one exchange account

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::exchange::Exchange;
use crate::pricing::{PriceTable, UnpricedReason};
use crate::{Balances, Fill, QuoteAsset};

/// Trade history lookback
pub const TRADE_WINDOW_DAYS: i64 = 7;

/// Value of one held currency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldingValue {
    Priced { price: Decimal, value: Decimal },
    Unpriced { reason: UnpricedReason },
}

impl HoldingValue {
    /// Contribution to the account total (zero when unpriced)
    pub fn value(&self) -> Decimal {
        match self {
            HoldingValue::Priced { value, .. } => *value,
            HoldingValue::Unpriced { .. } => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub currency: String,
    pub amount: Decimal,
    pub value: HoldingValue,
}

/// Holdings of an account valued in USDT
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortfolioValuation {
    pub holdings: Vec<Holding>,
    pub total: Decimal,
}

impl PortfolioValuation {
    pub fn unpriced(&self) -> impl Iterator<Item = &Holding> {
        self.holdings
            .iter()
            .filter(|h| matches!(h.value, HoldingValue::Unpriced { .. }))
    }
}

/// Value every strictly positive balance at its `{CURRENCY}USDT` price
pub fn value_balances(balances: &Balances, prices: &PriceTable) -> PortfolioValuation {
    let quote = QuoteAsset::Usdt.as_str();
    let mut valuation = PortfolioValuation::default();

    for (currency, amount) in balances.iter().filter(|(_, amount)| **amount > Decimal::ZERO) {
        let price = if currency == quote {
            Some(Decimal::ONE)
        } else {
            prices.get(&format!("{}{}", currency, quote))
        };

        let value = match price {
            Some(price) => HoldingValue::Priced {
                price,
                value: *amount * price,
            },
            None => HoldingValue::Unpriced {
                reason: UnpricedReason::PairNotListed,
            },
        };
        valuation.total += value.value();
        valuation.holdings.push(Holding {
            currency: currency.clone(),
            amount: *amount,
            value,
        });
    }

    valuation
}

/// Fetch and value an account's balances. Failures degrade to an empty valuation.
pub fn fetch_valuation(exchange: &dyn Exchange) -> PortfolioValuation {
    let balances = match exchange.fetch_balances() {
        Ok(balances) => balances,
        Err(e) => {
            warn!("Error fetching balances from {}: {}", exchange.kind(), e);
            return PortfolioValuation::default();
        }
    };

    let prices = exchange.fetch_prices().unwrap_or_else(|e| {
        warn!("Error fetching prices from {}: {}", exchange.kind(), e);
        PriceTable::new()
    });

    let valuation = value_balances(&balances, &prices);
    info!(
        "{}: {} holdings worth {} USDT",
        exchange.kind(),
        valuation.holdings.len(),
        valuation.total
    );
    valuation
}

/// Start of the trade window ending at `now`
pub fn trade_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(TRADE_WINDOW_DAYS)
}

/// Inclusive lower bound, as with the exchanges' `startTime` parameter
pub fn within_window(fill: &Fill, since: DateTime<Utc>) -> bool {
    fill.timestamp >= since
}

/// Every fill of the last seven days across all tradable symbols
pub fn fetch_recent_fills(exchange: &dyn Exchange, now: DateTime<Utc>) -> Vec<Fill> {
    let since = trade_window_start(now);
    let symbols = match exchange.list_symbols() {
        Ok(symbols) => symbols,
        Err(e) => {
            warn!("Error listing symbols on {}: {}", exchange.kind(), e);
            return Vec::new();
        }
    };

    info!(
        "Scanning {} {} symbols for fills since {}",
        symbols.len(),
        exchange.kind(),
        since.format("%Y-%m-%d %H:%M:%S")
    );

    let mut fills = Vec::new();
    let mut failed = 0usize;
    for symbol in &symbols {
        match exchange.fetch_fills(symbol, since) {
            Ok(batch) => fills.extend(batch.into_iter().filter(|f| within_window(f, since))),
            Err(e) => {
                failed += 1;
                debug!("Skipping {} on {}: {}", symbol, exchange.kind(), e);
            }
        }
    }

    if failed > 0 {
        warn!("{} of {} symbols failed on {}", failed, symbols.len(), exchange.kind());
    }
    fills.sort_by_key(|f| f.timestamp);
    fills
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExchangeError, ExchangeResult};
    use crate::exchange::ExchangeKind;
    use crate::Side;
    use rust_decimal_macros::dec;

    fn prices(entries: &[(&str, Decimal)]) -> PriceTable {
        entries.iter().map(|(s, p)| (s.to_string(), *p)).collect()
    }

    fn fill(symbol: &str, timestamp: DateTime<Utc>) -> Fill {
        Fill {
            symbol: symbol.to_string(),
            side: Some(Side::Buy),
            price: dec!(1),
            amount: dec!(1),
            timestamp,
        }
    }

    struct StubExchange {
        now: DateTime<Utc>,
        balances: Option<Balances>,
    }

    impl Exchange for StubExchange {
        fn kind(&self) -> ExchangeKind {
            ExchangeKind::Binance
        }

        fn fetch_prices(&self) -> ExchangeResult<PriceTable> {
            Ok(prices(&[("BTCUSDT", dec!(60000))]))
        }

        fn fetch_balances(&self) -> ExchangeResult<Balances> {
            self.balances
                .clone()
                .ok_or_else(|| ExchangeError::Credentials("no keys".to_string()))
        }

        fn list_symbols(&self) -> ExchangeResult<Vec<String>> {
            Ok(vec!["BTCUSDT".into(), "BADUSDT".into(), "ETHUSDT".into()])
        }

        fn fetch_fills(&self, symbol: &str, _since: DateTime<Utc>) -> ExchangeResult<Vec<Fill>> {
            match symbol {
                "BADUSDT" => Err(ExchangeError::Parse("boom".to_string())),
                "BTCUSDT" => Ok(vec![
                    fill(symbol, self.now - Duration::days(8)),
                    fill(symbol, self.now - Duration::hours(1)),
                ]),
                _ => Ok(vec![fill(symbol, self.now - Duration::days(2))]),
            }
        }
    }

    #[test]
    fn test_value_balances() {
        let balances: Balances = [
            ("BTC".to_string(), dec!(0.5)),
            ("USDT".to_string(), dec!(25)),
            ("OBSCURE".to_string(), dec!(1000)),
            ("DUST".to_string(), Decimal::ZERO),
        ]
        .into_iter()
        .collect();

        let valuation = value_balances(&balances, &prices(&[("BTCUSDT", dec!(60000))]));

        assert_eq!(valuation.total, dec!(30025));
        assert_eq!(valuation.holdings.len(), 3);
        let unpriced: Vec<&str> = valuation.unpriced().map(|h| h.currency.as_str()).collect();
        assert_eq!(unpriced, vec!["OBSCURE"]);
    }

    #[test]
    fn test_priced_at_zero_is_not_unpriced() {
        let balances: Balances = [("RUG".to_string(), dec!(10))].into_iter().collect();
        let valuation = value_balances(&balances, &prices(&[("RUGUSDT", Decimal::ZERO)]));

        assert_eq!(valuation.total, Decimal::ZERO);
        assert_eq!(valuation.unpriced().count(), 0);
    }

    #[test]
    fn test_window_is_inclusive() {
        let now = Utc::now();
        let since = trade_window_start(now);

        assert!(within_window(&fill("BTCUSDT", now - Duration::days(7)), since));
        assert!(!within_window(
            &fill("BTCUSDT", now - Duration::days(7) - Duration::milliseconds(1)),
            since
        ));
    }

    #[test]
    fn test_fetch_valuation_degrades_on_error() {
        let now = Utc::now();
        let failing = StubExchange { now, balances: None };
        assert_eq!(fetch_valuation(&failing), PortfolioValuation::default());

        let working = StubExchange {
            now,
            balances: Some([("BTC".to_string(), dec!(0.5))].into_iter().collect()),
        };
        assert_eq!(fetch_valuation(&working).total, dec!(30000));
    }

    #[test]
    fn test_fetch_recent_fills_skips_failures() {
        let now = Utc::now();
        let exchange = StubExchange { now, balances: None };

        let fills = fetch_recent_fills(&exchange, now);

        let symbols: Vec<&str> = fills.iter().map(|f| f.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETHUSDT", "BTCUSDT"]);
    }
}
