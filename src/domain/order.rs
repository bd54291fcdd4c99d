//! Entry orders produced by the buy pass.

use crate::domain::symbol::Symbol;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    FirstBuy,
    Averaging,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::FirstBuy => f.pad("BUY"),
            EntryKind::Averaging => f.pad("AVERAGE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryOrder {
    pub symbol: Symbol,
    pub kind: EntryKind,
    pub investment: f64,
    pub reference_price: f64,
    pub quantity: u64,
}

impl EntryOrder {
    /// Sizes an order as the whole number of shares `investment` buys at
    /// `reference_price`. Returns `None` when that is zero shares.
    pub fn sized(
        symbol: Symbol,
        kind: EntryKind,
        investment: f64,
        reference_price: f64,
    ) -> Option<EntryOrder> {
        if !reference_price.is_finite() || reference_price <= 0.0 || investment <= 0.0 {
            return None;
        }
        let quantity = (investment / reference_price).floor() as u64;
        if quantity == 0 {
            return None;
        }
        Some(EntryOrder {
            symbol,
            kind,
            investment,
            reference_price,
            quantity,
        })
    }

    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.reference_price
    }
}
