//! Paper broker that appends every order to a CSV journal.

use crate::domain::error::NiftyShopError;
use crate::domain::order::EntryOrder;
use crate::domain::trade::Trade;
use crate::ports::broker_port::BrokerPort;
use chrono::Local;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::PathBuf;

const HEADER: [&str; 7] = [
    "Recorded",
    "Action",
    "Symbol",
    "Quantity",
    "Price",
    "Investment",
    "Trade Id",
];

#[derive(Debug, Serialize)]
struct JournalRow<'a> {
    recorded: String,
    action: String,
    symbol: &'a str,
    quantity: u64,
    /// Reference price of an entry; square-offs go at market and leave it blank.
    price: Option<f64>,
    investment: Option<f64>,
    trade_id: Option<&'a str>,
}

pub struct CsvOrderJournal {
    path: PathBuf,
}

impl CsvOrderJournal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn append(&self, row: &JournalRow<'_>) -> Result<(), NiftyShopError> {
        let broker_err = |reason: String| NiftyShopError::Broker {
            symbol: row.symbol.to_string(),
            reason,
        };

        let is_new = self
            .path
            .metadata()
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| broker_err(format!("failed to open {}: {}", self.path.display(), e)))?;

        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            wtr.write_record(HEADER)
                .map_err(|e| broker_err(format!("journal write error: {}", e)))?;
        }
        wtr.serialize(row)
            .map_err(|e| broker_err(format!("journal write error: {}", e)))?;
        wtr.flush()
            .map_err(|e| broker_err(format!("journal flush error: {}", e)))?;
        Ok(())
    }

    fn now() -> String {
        Local::now().naive_local().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl BrokerPort for CsvOrderJournal {
    fn place_entry_order(&self, order: &EntryOrder) -> Result<(), NiftyShopError> {
        self.append(&JournalRow {
            recorded: Self::now(),
            action: order.kind.to_string(),
            symbol: order.symbol.as_str(),
            quantity: order.quantity,
            price: Some(order.reference_price),
            investment: Some(order.investment),
            trade_id: None,
        })
    }

    fn square_off(&self, trade: &Trade) -> Result<(), NiftyShopError> {
        self.append(&JournalRow {
            recorded: Self::now(),
            action: "SQUARE_OFF".to_string(),
            symbol: trade.symbol.as_str(),
            quantity: trade.filled_qty,
            price: None,
            investment: None,
            trade_id: Some(&trade.id),
        })
    }
}
