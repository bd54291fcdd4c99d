//! One daily decision cycle.
//!
//! Order of operations:
//! 1. universe (configured list, else provider, else static fallback)
//! 2. ledger snapshot
//! 3. quotes + position aggregation
//! 4. sell pass, square-offs
//! 5. post-sell snapshot + re-aggregation
//! 6. screening, buy/averaging pass
//! 7. entry orders
//!
//! Only a ledger failure aborts the cycle. Everything else degrades to
//! "skip and continue" and is recorded in the [`CycleReport`].

use crate::domain::decision::{BuyDecision, SellDecision, decide_buys, decide_sells};
use crate::domain::error::NiftyShopError;
use crate::domain::order::{EntryKind, EntryOrder};
use crate::domain::position::{Aggregation, QuoteBook, aggregate};
use crate::domain::screening::{ScreenConfig, ScreeningReport, screen};
use crate::domain::strategy::StrategyParams;
use crate::domain::symbol::Symbol;
use crate::domain::trade::LedgerSnapshot;
use crate::domain::universe::{Universe, resolve_universe};
use crate::ports::broker_port::BrokerPort;
use crate::ports::data_port::DataPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::quote_port::QuotePort;
use chrono::NaiveDate;
use std::fmt;
use tracing::{info, warn};

pub struct CyclePorts<'a> {
    pub data: &'a dyn DataPort,
    pub quotes: &'a dyn QuotePort,
    pub ledger: &'a dyn LedgerPort,
    pub broker: &'a dyn BrokerPort,
}

#[derive(Debug, Clone)]
pub struct CycleOptions {
    pub as_of: NaiveDate,
    pub index: String,
    /// Screen exactly these symbols instead of the index constituents.
    pub symbols: Option<Vec<Symbol>>,
    /// Compute every decision without calling the broker.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionFailure {
    SquareOff {
        symbol: Symbol,
        trade_id: String,
        reason: String,
    },
    Entry {
        symbol: Symbol,
        reason: String,
    },
    /// Investment too small for a single share at the reference price.
    ZeroQuantity {
        symbol: Symbol,
        investment: f64,
        price: f64,
    },
}

impl ActionFailure {
    pub fn symbol(&self) -> &Symbol {
        match self {
            ActionFailure::SquareOff { symbol, .. }
            | ActionFailure::Entry { symbol, .. }
            | ActionFailure::ZeroQuantity { symbol, .. } => symbol,
        }
    }
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionFailure::SquareOff { trade_id, reason, .. } => {
                write!(f, "square-off of {} failed: {}", trade_id, reason)
            }
            ActionFailure::Entry { reason, .. } => write!(f, "entry order failed: {}", reason),
            ActionFailure::ZeroQuantity { investment, price, .. } => write!(
                f,
                "investment {:.2} buys zero shares at {:.2}",
                investment, price
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub strategy: String,
    pub as_of: NaiveDate,
    pub dry_run: bool,
    pub universe: Universe,
    pub positions_before: Aggregation,
    pub sells: Vec<SellDecision>,
    /// Trade ids squared off, in order.
    pub squared_off: Vec<String>,
    pub positions_after: Aggregation,
    pub screening: ScreeningReport,
    pub buy: BuyDecision,
    pub orders: Vec<EntryOrder>,
    pub failures: Vec<ActionFailure>,
}

impl CycleReport {
    pub fn sold_symbols(&self) -> Vec<Symbol> {
        self.sells.iter().map(|s| s.symbol.clone()).collect()
    }
}

pub fn run_cycle(
    ports: &CyclePorts<'_>,
    params: &StrategyParams,
    options: &CycleOptions,
) -> Result<CycleReport, NiftyShopError> {
    info!(strategy = %params.name, as_of = %options.as_of, dry_run = options.dry_run, "starting cycle");

    let universe = match &options.symbols {
        Some(symbols) => Universe::configured(&options.index, symbols.clone()),
        None => resolve_universe(ports.data, &options.index),
    };

    let snapshot = LedgerSnapshot::new(ports.ledger.list_trades(&params.name)?);
    let held: Vec<Symbol> = snapshot
        .open_lots(&params.name)
        .map(|t| t.symbol.clone())
        .collect();
    let quote_book = QuoteBook::fetch(ports.quotes, &held);

    // sell pass
    let positions_before = aggregate(&snapshot, &params.name, &quote_book);
    let sells = decide_sells(
        &positions_before.positions,
        params.target_pct,
        params.max_sells_per_day,
    );

    let mut failures = Vec::new();
    let mut squared_off = Vec::new();

    if sells.is_empty() {
        info!(target_pct = params.target_pct, "no symbol meets the aggregate target");
    }
    for sell in &sells {
        info!(symbol = %sell.symbol, pnl_pct = sell.pnl_pct, "selling");
        for lot in snapshot.lots_for(&params.name, &sell.symbol) {
            if !options.dry_run {
                if let Err(e) = ports.broker.square_off(lot) {
                    warn!(symbol = %sell.symbol, trade = %lot.id, error = %e, "square-off failed");
                    failures.push(ActionFailure::SquareOff {
                        symbol: sell.symbol.clone(),
                        trade_id: lot.id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            }
            squared_off.push(lot.id.clone());
        }
    }

    // buy pass sees the ledger as it stands after the exits
    let sold: Vec<Symbol> = sells.iter().map(|s| s.symbol.clone()).collect();
    let post_sell = snapshot.with_exits(&params.name, &sold);
    let positions_after = aggregate(&post_sell, &params.name, &quote_book);

    let screening = screen(
        ports.data,
        &universe.symbols,
        options.as_of,
        &ScreenConfig {
            lookback_days: params.lookback_days,
            top_k: params.top_k,
        },
    );

    let buy = decide_buys(
        &screening.candidates,
        &post_sell,
        &positions_after.positions,
        params,
    );

    let intended: Vec<(Symbol, EntryKind, f64, f64)> = match &buy {
        BuyDecision::NewBuys(stocks) => stocks
            .iter()
            .map(|s| {
                info!(symbol = %s.symbol, deviation = s.deviation_pct, "initiating buy");
                (s.symbol.clone(), EntryKind::FirstBuy, params.investment_first_buy, s.close)
            })
            .collect(),
        BuyDecision::Average(candidate) => {
            info!(
                symbol = %candidate.symbol,
                change_pct = candidate.change_pct,
                averaged = candidate.averaging_count,
                "averaging candidate"
            );
            vec![(
                candidate.symbol.clone(),
                EntryKind::Averaging,
                params.investment_averaging,
                candidate.current_price,
            )]
        }
        BuyDecision::NoAction(reason) => {
            info!(reason = %reason, "no buy today");
            Vec::new()
        }
    };

    let mut orders = Vec::new();
    for (symbol, kind, investment, price) in intended {
        let Some(order) = EntryOrder::sized(symbol.clone(), kind, investment, price) else {
            warn!(symbol = %symbol, investment, price, "investment buys zero shares, order skipped");
            failures.push(ActionFailure::ZeroQuantity {
                symbol,
                investment,
                price,
            });
            continue;
        };

        if !options.dry_run {
            if let Err(e) = ports.broker.place_entry_order(&order) {
                warn!(symbol = %symbol, error = %e, "entry order failed");
                failures.push(ActionFailure::Entry {
                    symbol,
                    reason: e.to_string(),
                });
                continue;
            }
        }
        orders.push(order);
    }

    info!(
        sold = sells.len(),
        orders = orders.len(),
        failures = failures.len(),
        "cycle complete"
    );

    Ok(CycleReport {
        strategy: params.name.clone(),
        as_of: options.as_of,
        dry_run: options.dry_run,
        universe,
        positions_before,
        sells,
        squared_off,
        positions_after,
        screening,
        buy,
        orders,
        failures,
    })
}
