#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use niftyshop::domain::error::NiftyShopError;
use niftyshop::domain::order::EntryOrder;
pub use niftyshop::domain::price_series::{PricePoint, PriceSeries};
pub use niftyshop::domain::symbol::Symbol;
use niftyshop::domain::trade::{Direction, OrderStatus, Trade, TradeState};
use niftyshop::ports::broker_port::BrokerPort;
use niftyshop::ports::data_port::DataPort;
use niftyshop::ports::ledger_port::LedgerPort;
use niftyshop::ports::quote_port::QuotePort;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

pub const STRATEGY: &str = "NiftyShop";

pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
}

pub fn at(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 4, day)
        .unwrap()
        .and_hms_opt(15, 25, 0)
        .unwrap()
}

/// Daily closes ending on `end`, one per calendar day.
pub fn daily_points(end: NaiveDate, closes: &[f64]) -> Vec<PricePoint> {
    let n = closes.len() as i64;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: end - Duration::days(n - 1 - i as i64),
            close,
        })
        .collect()
}

/// 19 closes at `level` followed by `last`: 20DMA = (19 × level + last) / 20.
pub fn dip(level: f64, last: f64) -> Vec<f64> {
    let mut closes = vec![level; 19];
    closes.push(last);
    closes
}

pub struct MockDataPort {
    pub history: HashMap<Symbol, Vec<PricePoint>>,
    pub errors: HashMap<Symbol, String>,
    pub listing: Result<Vec<Symbol>, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            history: HashMap::new(),
            errors: HashMap::new(),
            listing: Ok(Vec::new()),
        }
    }

    /// Adds the symbol to the index listing with closes ending on [`as_of`].
    pub fn with_closes(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.history
            .insert(symbol.into(), daily_points(as_of(), closes));
        if let Ok(listing) = &mut self.listing {
            listing.push(symbol.into());
        }
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.into(), reason.to_string());
        if let Ok(listing) = &mut self.listing {
            listing.push(symbol.into());
        }
        self
    }

    pub fn with_listing_error(mut self, reason: &str) -> Self {
        self.listing = Err(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_history(
        &self,
        symbol: &Symbol,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<PriceSeries>, NiftyShopError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(NiftyShopError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.history.get(symbol).map(|points| {
            let in_range = points
                .iter()
                .filter(|p| p.date >= start_date && p.date <= end_date)
                .cloned()
                .collect();
            PriceSeries::new(symbol.clone(), in_range)
        }))
    }

    fn list_symbols(&self, _index: &str) -> Result<Vec<Symbol>, NiftyShopError> {
        self.listing.clone().map_err(|reason| NiftyShopError::Data { reason })
    }
}

pub struct MockQuotes {
    pub prices: HashMap<Symbol, f64>,
    pub calls: Cell<usize>,
}

impl MockQuotes {
    pub fn new(prices: &[(&str, f64)]) -> Self {
        Self {
            prices: prices.iter().map(|&(s, p)| (Symbol::from(s), p)).collect(),
            calls: Cell::new(0),
        }
    }
}

impl QuotePort for MockQuotes {
    fn current_price(&self, symbol: &Symbol) -> Result<Option<f64>, NiftyShopError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.prices.get(symbol).copied())
    }
}

pub struct MockLedger {
    pub trades: Vec<Trade>,
    pub error: Option<String>,
}

impl MockLedger {
    pub fn new(trades: Vec<Trade>) -> Self {
        Self {
            trades,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            trades: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl LedgerPort for MockLedger {
    fn list_trades(&self, strategy: &str) -> Result<Vec<Trade>, NiftyShopError> {
        if let Some(reason) = &self.error {
            return Err(NiftyShopError::Ledger {
                reason: reason.clone(),
            });
        }
        Ok(self
            .trades
            .iter()
            .filter(|t| t.strategy == strategy)
            .cloned()
            .collect())
    }
}

/// Broker that records every call in order and can reject chosen symbols.
pub struct RecordingBroker {
    pub events: RefCell<Vec<String>>,
    pub entries: RefCell<Vec<EntryOrder>>,
    pub squared_off: RefCell<Vec<String>>,
    pub reject: HashSet<Symbol>,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            entries: RefCell::new(Vec::new()),
            squared_off: RefCell::new(Vec::new()),
            reject: HashSet::new(),
        }
    }

    pub fn rejecting(symbols: &[&str]) -> Self {
        Self {
            reject: symbols.iter().map(|&s| Symbol::from(s)).collect(),
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.events.borrow().len()
    }
}

impl BrokerPort for RecordingBroker {
    fn place_entry_order(&self, order: &EntryOrder) -> Result<(), NiftyShopError> {
        self.events
            .borrow_mut()
            .push(format!("{} {}", order.kind, order.symbol));
        if self.reject.contains(&order.symbol) {
            return Err(NiftyShopError::Broker {
                symbol: order.symbol.to_string(),
                reason: "rejected".to_string(),
            });
        }
        self.entries.borrow_mut().push(order.clone());
        Ok(())
    }

    fn square_off(&self, trade: &Trade) -> Result<(), NiftyShopError> {
        self.events
            .borrow_mut()
            .push(format!("SQUARE_OFF {}", trade.symbol));
        if self.reject.contains(&trade.symbol) {
            return Err(NiftyShopError::Broker {
                symbol: trade.symbol.to_string(),
                reason: "rejected".to_string(),
            });
        }
        self.squared_off.borrow_mut().push(trade.id.clone());
        Ok(())
    }
}

/// Active, filled long lot of [`STRATEGY`] created on 2024-04-`day`.
pub fn lot(id: &str, symbol: &str, entry_price: f64, qty: u64, day: u32) -> Trade {
    Trade {
        id: id.to_string(),
        strategy: STRATEGY.to_string(),
        symbol: symbol.into(),
        direction: Direction::Long,
        entry_price,
        filled_qty: qty,
        entry_status: OrderStatus::Complete,
        created_at: at(day),
        state: TradeState::Active,
        target_order: None,
    }
}

pub fn closed_lot(id: &str, symbol: &str, entry_price: f64, qty: u64, day: u32) -> Trade {
    Trade {
        state: TradeState::Closed,
        ..lot(id, symbol, entry_price, qty, day)
    }
}
