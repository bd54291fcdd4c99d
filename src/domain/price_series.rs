//! Daily closing-price history for one symbol.

use crate::domain::symbol::Symbol;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn is_valid(&self) -> bool {
        self.close.is_finite()
    }
}

/// Closing prices ordered by date, one point per date.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: Symbol,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sorts by date and drops duplicate dates, keeping the last observation
    /// supplied for each date.
    pub fn new(symbol: Symbol, points: Vec<PricePoint>) -> Self {
        let mut indexed: Vec<(usize, PricePoint)> = points.into_iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| a.date.cmp(&b.date).then(ib.cmp(ia)));
        indexed.dedup_by(|(_, later), (_, kept)| later.date == kept.date);

        Self {
            symbol,
            points: indexed.into_iter().map(|(_, p)| p).collect(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn valid_closes(&self) -> usize {
        self.points.iter().filter(|p| p.is_valid()).count()
    }
}
