//! Trade ledger records and snapshots.
//!
//! A [`Trade`] is one fill event owned by the external ledger. The decision
//! logic only ever sees a [`LedgerSnapshot`] handed to it explicitly.

use crate::domain::symbol::Symbol;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Open,
    Complete,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeState {
    Active,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: String,
    pub strategy: String,
    pub symbol: Symbol,
    pub direction: Direction,
    pub entry_price: f64,
    pub filled_qty: u64,
    pub entry_status: OrderStatus,
    pub created_at: NaiveDateTime,
    pub state: TradeState,
    pub target_order: Option<String>,
}

impl Trade {
    /// Entry order completed with a non-zero fill.
    pub fn is_filled(&self) -> bool {
        self.entry_status == OrderStatus::Complete && self.filled_qty > 0
    }

    /// An active, fully-filled lot of `strategy` with no exit order placed yet.
    pub fn is_open_lot(&self, strategy: &str) -> bool {
        self.strategy == strategy
            && self.state == TradeState::Active
            && self.target_order.is_none()
            && self.is_filled()
    }

    pub fn cost(&self) -> f64 {
        self.entry_price * self.filled_qty as f64
    }
}

/// Immutable view of one strategy's trades at a point in the cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    trades: Vec<Trade>,
}

impl LedgerSnapshot {
    pub fn new(trades: Vec<Trade>) -> Self {
        Self { trades }
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn open_lots<'a>(&'a self, strategy: &'a str) -> impl Iterator<Item = &'a Trade> + 'a {
        self.trades.iter().filter(move |t| t.is_open_lot(strategy))
    }

    /// Symbols held by an active trade of `strategy`.
    pub fn held_symbols(&self, strategy: &str) -> BTreeSet<Symbol> {
        self.trades
            .iter()
            .filter(|t| t.strategy == strategy && t.state == TradeState::Active)
            .map(|t| t.symbol.clone())
            .collect()
    }

    /// Completed long entries ever placed by `strategy` for `symbol`,
    /// active or closed.
    pub fn averaging_count(&self, strategy: &str, symbol: &Symbol) -> usize {
        self.trades
            .iter()
            .filter(|t| {
                t.strategy == strategy
                    && &t.symbol == symbol
                    && t.direction == Direction::Long
                    && t.is_filled()
            })
            .count()
    }

    /// Active lots of `strategy` for `symbol` that a full exit must square off.
    pub fn lots_for<'a>(&'a self, strategy: &'a str, symbol: &'a Symbol) -> Vec<&'a Trade> {
        self.open_lots(strategy)
            .filter(|t| &t.symbol == symbol)
            .collect()
    }

    /// New snapshot in which every active trade of `strategy` on the given
    /// symbols is closed.
    pub fn with_exits(&self, strategy: &str, sold: &[Symbol]) -> LedgerSnapshot {
        let trades = self
            .trades
            .iter()
            .cloned()
            .map(|mut t| {
                if t.strategy == strategy
                    && t.state == TradeState::Active
                    && sold.contains(&t.symbol)
                {
                    t.state = TradeState::Closed;
                }
                t
            })
            .collect();
        LedgerSnapshot { trades }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(15, 25, 0)
            .unwrap()
    }

    fn trade(id: &str, symbol: &str, entry: f64, qty: u64, day: u32) -> Trade {
        Trade {
            id: id.into(),
            strategy: "NiftyShop".into(),
            symbol: symbol.into(),
            direction: Direction::Long,
            entry_price: entry,
            filled_qty: qty,
            entry_status: OrderStatus::Complete,
            created_at: at(day),
            state: TradeState::Active,
            target_order: None,
        }
    }

    #[test]
    fn open_lot_requires_all_conditions() {
        let base = trade("1", "TCS.NS", 100.0, 10, 1);
        assert!(base.is_open_lot("NiftyShop"));
        assert!(!base.is_open_lot("Other"));

        let mut t = base.clone();
        t.state = TradeState::Closed;
        assert!(!t.is_open_lot("NiftyShop"));

        let mut t = base.clone();
        t.target_order = Some("T1".into());
        assert!(!t.is_open_lot("NiftyShop"));

        let mut t = base.clone();
        t.entry_status = OrderStatus::Open;
        assert!(!t.is_open_lot("NiftyShop"));

        let mut t = base;
        t.filled_qty = 0;
        assert!(!t.is_open_lot("NiftyShop"));
    }

    #[test]
    fn held_symbols_only_active_for_strategy() {
        let mut closed = trade("2", "INFY.NS", 100.0, 10, 1);
        closed.state = TradeState::Closed;
        let mut other = trade("3", "SBIN.NS", 100.0, 10, 1);
        other.strategy = "Other".into();

        let snapshot = LedgerSnapshot::new(vec![trade("1", "TCS.NS", 100.0, 10, 1), closed, other]);
        let held = snapshot.held_symbols("NiftyShop");
        assert_eq!(held.len(), 1);
        assert!(held.contains("TCS.NS"));
    }

    #[test]
    fn averaging_count_includes_closed_fills() {
        let mut closed = trade("1", "TCS.NS", 100.0, 10, 1);
        closed.state = TradeState::Closed;
        let mut unfilled = trade("3", "TCS.NS", 95.0, 0, 3);
        unfilled.entry_status = OrderStatus::Rejected;

        let snapshot = LedgerSnapshot::new(vec![
            closed,
            trade("2", "TCS.NS", 98.0, 10, 2),
            unfilled,
            trade("4", "INFY.NS", 50.0, 10, 2),
        ]);
        assert_eq!(snapshot.averaging_count("NiftyShop", &"TCS.NS".into()), 2);
    }

    #[test]
    fn with_exits_closes_sold_symbols_only() {
        let snapshot = LedgerSnapshot::new(vec![
            trade("1", "TCS.NS", 100.0, 10, 1),
            trade("2", "TCS.NS", 90.0, 10, 2),
            trade("3", "INFY.NS", 50.0, 10, 2),
        ]);

        let after = snapshot.with_exits("NiftyShop", &["TCS.NS".into()]);

        assert!(after.lots_for("NiftyShop", &"TCS.NS".into()).is_empty());
        assert_eq!(after.lots_for("NiftyShop", &"INFY.NS".into()).len(), 1);
        // the source snapshot is untouched
        assert_eq!(snapshot.lots_for("NiftyShop", &"TCS.NS".into()).len(), 2);
    }

    #[test]
    fn cost_is_price_times_qty() {
        assert_eq!(trade("1", "TCS.NS", 12.5, 4, 1).cost(), 50.0);
    }
}
