//! Sell and buy/averaging decisions.
//!
//! The sell pass always runs first. The buy pass is handed the ledger
//! snapshot with the sell pass's exits already applied, so a symbol sold in
//! this cycle is neither "held" nor an averaging candidate.

use crate::domain::position::Position;
use crate::domain::screening::ScreenedStock;
use crate::domain::strategy::StrategyParams;
use crate::domain::symbol::Symbol;
use crate::domain::trade::LedgerSnapshot;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct SellDecision {
    pub symbol: Symbol,
    pub pnl_pct: f64,
}

/// Symbols whose aggregate P&L% reached `target_pct`, best performer first,
/// at most `max_sells_per_day` of them.
pub fn decide_sells(
    positions: &BTreeMap<Symbol, Position>,
    target_pct: f64,
    max_sells_per_day: usize,
) -> Vec<SellDecision> {
    let mut candidates: Vec<SellDecision> = positions
        .values()
        .filter(|p| p.unrealized_pnl_pct >= target_pct)
        .map(|p| SellDecision {
            symbol: p.symbol.clone(),
            pnl_pct: p.unrealized_pnl_pct,
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.pnl_pct
            .partial_cmp(&a.pnl_pct)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    candidates.truncate(max_sells_per_day);
    candidates
}

#[derive(Debug, Clone, PartialEq)]
pub struct AveragingCandidate {
    pub symbol: Symbol,
    pub change_pct: f64,
    /// Filled entries already placed for the symbol.
    pub averaging_count: usize,
    pub current_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoActionReason {
    /// Nothing screened below its 20DMA; averaging is not considered.
    NothingEligible,
    /// Every screened stock is already held and no holding qualifies for averaging.
    NoAveragingCandidate,
}

impl fmt::Display for NoActionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoActionReason::NothingEligible => write!(f, "no eligible stocks"),
            NoActionReason::NoAveragingCandidate => {
                write!(f, "screened stocks already held, no averaging candidate")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuyDecision {
    NewBuys(Vec<ScreenedStock>),
    Average(AveragingCandidate),
    NoAction(NoActionReason),
}

impl BuyDecision {
    pub fn is_new_buy(&self) -> bool {
        matches!(self, BuyDecision::NewBuys(_))
    }
}

/// Screened stocks not held by the strategy, in deviation order, capped at
/// `max_buys_per_day`.
pub fn select_new_buys(
    screened: &[ScreenedStock],
    snapshot: &LedgerSnapshot,
    strategy: &str,
    max_buys_per_day: usize,
) -> Vec<ScreenedStock> {
    let held = snapshot.held_symbols(strategy);
    screened
        .iter()
        .filter(|s| !held.contains(&s.symbol))
        .take(max_buys_per_day)
        .cloned()
        .collect()
}

/// Every held position that fell at least `averaging_pct` below its last
/// buy price and is still under the averaging cap, most fallen first.
pub fn averaging_candidates(
    positions: &BTreeMap<Symbol, Position>,
    snapshot: &LedgerSnapshot,
    params: &StrategyParams,
) -> Vec<AveragingCandidate> {
    let mut candidates: Vec<AveragingCandidate> = positions
        .values()
        .map(|p| AveragingCandidate {
            symbol: p.symbol.clone(),
            change_pct: p.change_since_last_buy_pct(),
            averaging_count: snapshot.averaging_count(&params.name, &p.symbol),
            current_price: p.current_price,
        })
        .filter(|c| c.change_pct <= params.averaging_pct)
        .filter(|c| c.averaging_count < params.max_averaging_per_stock)
        .collect();

    candidates.sort_by(|a, b| {
        a.change_pct
            .partial_cmp(&b.change_pct)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    candidates
}

/// Buy pass. `snapshot` and `positions` must reflect the sell pass's exits.
///
/// Averaging is a fallback for a day whose eligible stocks are all held: an
/// empty screen takes no action at all.
pub fn decide_buys(
    screened: &[ScreenedStock],
    snapshot: &LedgerSnapshot,
    positions: &BTreeMap<Symbol, Position>,
    params: &StrategyParams,
) -> BuyDecision {
    if screened.is_empty() {
        return BuyDecision::NoAction(NoActionReason::NothingEligible);
    }

    let new_buys = select_new_buys(screened, snapshot, &params.name, params.max_buys_per_day);
    if !new_buys.is_empty() {
        return BuyDecision::NewBuys(new_buys);
    }

    match averaging_candidates(positions, snapshot, params).into_iter().next() {
        Some(candidate) => BuyDecision::Average(candidate),
        None => BuyDecision::NoAction(NoActionReason::NoAveragingCandidate),
    }
}
