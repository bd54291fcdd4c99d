//! Per-symbol position aggregation.
//!
//! Positions are derived from a [`LedgerSnapshot`] on every cycle and never
//! cached. Only open lots of the strategy count (active, no target order,
//! entry complete with a non-zero fill). A symbol without a current quote is
//! left out of the result.

use crate::domain::error::NiftyShopError;
use crate::domain::symbol::Symbol;
use crate::domain::trade::{LedgerSnapshot, Trade};
use crate::ports::quote_port::QuotePort;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: Symbol,
    pub total_qty: u64,
    pub weighted_avg_entry: f64,
    pub current_price: f64,
    pub unrealized_pnl_pct: f64,
    pub lots: usize,
    /// Entry price of the most recently created lot.
    pub last_entry_price: f64,
    pub last_entry_at: NaiveDateTime,
}

impl Position {
    pub fn unrealized_pnl(&self) -> f64 {
        self.total_qty as f64 * (self.current_price - self.weighted_avg_entry)
    }

    pub fn market_value(&self) -> f64 {
        self.total_qty as f64 * self.current_price
    }

    /// % change from the last buy price to the current price.
    pub fn change_since_last_buy_pct(&self) -> f64 {
        round2(pct_change(self.last_entry_price, self.current_price))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub positions: BTreeMap<Symbol, Position>,
    /// Held symbols left out because no quote was available.
    pub unpriced: Vec<Symbol>,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn pct_change(from: f64, to: f64) -> f64 {
    (to - from) / from * 100.0
}

/// Σ(entry × qty) / Σqty, or `None` for an empty or zero-quantity set.
pub fn weighted_average_entry<'a>(lots: impl IntoIterator<Item = &'a Trade>) -> Option<f64> {
    let (cost, qty) = lots
        .into_iter()
        .fold((0.0, 0u64), |(cost, qty), t| (cost + t.cost(), qty + t.filled_qty));
    if qty == 0 {
        None
    } else {
        Some(cost / qty as f64)
    }
}

pub fn aggregate(snapshot: &LedgerSnapshot, strategy: &str, quotes: &dyn QuotePort) -> Aggregation {
    let mut grouped: BTreeMap<Symbol, Vec<&Trade>> = BTreeMap::new();
    for trade in snapshot.open_lots(strategy) {
        grouped.entry(trade.symbol.clone()).or_default().push(trade);
    }

    let mut result = Aggregation::default();

    for (symbol, lots) in grouped {
        let Some(weighted_avg_entry) = weighted_average_entry(lots.iter().copied()) else {
            continue;
        };

        let current_price = match quotes.current_price(&symbol) {
            Ok(Some(price)) if price.is_finite() && price > 0.0 => price,
            Ok(_) => {
                debug!(symbol = %symbol, "no quote, excluded from positions");
                result.unpriced.push(symbol);
                continue;
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "quote lookup failed, excluded from positions");
                result.unpriced.push(symbol);
                continue;
            }
        };

        let Some(last) = lots.iter().max_by_key(|t| t.created_at) else {
            continue;
        };

        let position = Position {
            symbol: symbol.clone(),
            total_qty: lots.iter().map(|t| t.filled_qty).sum(),
            weighted_avg_entry,
            current_price,
            unrealized_pnl_pct: round2(pct_change(weighted_avg_entry, current_price)),
            lots: lots.len(),
            last_entry_price: last.entry_price,
            last_entry_at: last.created_at,
        };
        result.positions.insert(symbol, position);
    }

    result
}

/// Quotes fetched once and reused within a single cycle.
#[derive(Debug, Clone, Default)]
pub struct QuoteBook {
    prices: HashMap<Symbol, Option<f64>>,
}

impl QuoteBook {
    pub fn fetch<'a>(quotes: &dyn QuotePort, symbols: impl IntoIterator<Item = &'a Symbol>) -> Self {
        let mut prices = HashMap::new();
        for symbol in symbols {
            if prices.contains_key(symbol) {
                continue;
            }
            let price = match quotes.current_price(symbol) {
                Ok(price) => price,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "quote lookup failed");
                    None
                }
            };
            prices.insert(symbol.clone(), price);
        }
        Self { prices }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl QuotePort for QuoteBook {
    fn current_price(&self, symbol: &Symbol) -> Result<Option<f64>, NiftyShopError> {
        Ok(self.prices.get(symbol).copied().flatten())
    }
}
