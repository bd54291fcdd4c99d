//! CSV trade ledger adapter.
//!
//! Reads a trade export with the columns
//! `Id,Strategy,Symbol,Direction,Entry,Filled Qty,Entry Status,Created,Status,Target Order`.

use crate::domain::error::NiftyShopError;
use crate::domain::trade::{Direction, OrderStatus, Trade, TradeState};
use crate::ports::ledger_port::LedgerPort;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct LedgerRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Strategy")]
    strategy: String,
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Direction")]
    direction: String,
    #[serde(rename = "Entry")]
    entry: f64,
    #[serde(rename = "Filled Qty")]
    filled_qty: u64,
    #[serde(rename = "Entry Status")]
    entry_status: String,
    #[serde(rename = "Created")]
    created: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Target Order", default)]
    target_order: Option<String>,
}

pub struct CsvLedgerAdapter {
    path: PathBuf,
}

impl CsvLedgerAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> Result<Vec<Trade>, NiftyShopError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| NiftyShopError::Ledger {
                reason: format!("failed to open {}: {}", self.path.display(), e),
            })?;

        let mut trades = Vec::new();
        for (line, result) in rdr.deserialize::<LedgerRow>().enumerate() {
            let row = result.map_err(|e| NiftyShopError::Ledger {
                reason: format!("row {}: {}", line + 1, e),
            })?;
            trades.push(to_trade(row).map_err(|reason| NiftyShopError::Ledger {
                reason: format!("row {}: {}", line + 1, reason),
            })?);
        }
        Ok(trades)
    }
}

fn to_trade(row: LedgerRow) -> Result<Trade, String> {
    Ok(Trade {
        direction: parse_direction(&row.direction)?,
        entry_status: parse_order_status(&row.entry_status)?,
        created_at: parse_timestamp(&row.created)?,
        state: parse_state(&row.status)?,
        id: row.id,
        strategy: row.strategy,
        symbol: row.symbol.into(),
        entry_price: row.entry,
        filled_qty: row.filled_qty,
        target_order: row.target_order.filter(|t| !t.trim().is_empty()),
    })
}

fn parse_direction(value: &str) -> Result<Direction, String> {
    match value.to_ascii_uppercase().as_str() {
        "LONG" | "BUY" => Ok(Direction::Long),
        "SHORT" | "SELL" => Ok(Direction::Short),
        other => Err(format!("unknown direction '{}'", other)),
    }
}

fn parse_order_status(value: &str) -> Result<OrderStatus, String> {
    match value.to_ascii_uppercase().as_str() {
        "COMPLETE" | "COMPLETED" | "FILLED" => Ok(OrderStatus::Complete),
        "OPEN" | "PENDING" | "TRIGGER PENDING" => Ok(OrderStatus::Open),
        "CANCELLED" | "CANCELED" => Ok(OrderStatus::Cancelled),
        "REJECTED" => Ok(OrderStatus::Rejected),
        other => Err(format!("unknown entry status '{}'", other)),
    }
}

fn parse_state(value: &str) -> Result<TradeState, String> {
    match value.to_ascii_lowercase().as_str() {
        "active" => Ok(TradeState::Active),
        "closed" | "completed" | "squared off" => Ok(TradeState::Closed),
        other => Err(format!("unknown trade status '{}'", other)),
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("invalid timestamp '{}'", value))
}

impl LedgerPort for CsvLedgerAdapter {
    fn list_trades(&self, strategy: &str) -> Result<Vec<Trade>, NiftyShopError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|t| t.strategy == strategy)
            .collect())
    }
}
