//! CSV decision report adapter implementing ReportPort.
//!
//! One row per line item, tagged by section:
//! - `SCREEN` top-K screened stocks (deviation, CMP, 20 DMA)
//! - `SKIP` symbols dropped by screening
//! - `HOLDING` positions before the sell pass
//! - `SELL` symbols squared off
//! - `ORDER` entry orders (BUY or AVERAGE)
//! - `NO_ACTION` why the buy pass placed nothing
//! - `FAILURE` actions that were attempted and failed

use crate::domain::cycle::CycleReport;
use crate::domain::decision::BuyDecision;
use crate::domain::error::NiftyShopError;
use crate::ports::report_port::ReportPort;
use serde::Serialize;

#[derive(Debug, Default, Serialize)]
struct ReportRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Section")]
    section: &'static str,
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Deviation %")]
    deviation_pct: Option<f64>,
    #[serde(rename = "CMP")]
    cmp: Option<f64>,
    #[serde(rename = "20 DMA")]
    dma: Option<f64>,
    #[serde(rename = "P&L %")]
    pnl_pct: Option<f64>,
    #[serde(rename = "Quantity")]
    quantity: Option<u64>,
    #[serde(rename = "Detail")]
    detail: String,
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn report_rows(report: &CycleReport) -> Vec<ReportRow> {
    let date = report.as_of.to_string();
    let row = |section: &'static str, symbol: String| ReportRow {
        date: date.clone(),
        section,
        symbol,
        ..ReportRow::default()
    };

    let mut rows = Vec::new();

    for stock in &report.screening.candidates {
        rows.push(ReportRow {
            deviation_pct: Some(stock.deviation_pct),
            cmp: Some(stock.close),
            dma: Some(stock.dma),
            ..row("SCREEN", stock.symbol.to_string())
        });
    }

    for skipped in &report.screening.skipped {
        rows.push(ReportRow {
            detail: skipped.reason.to_string(),
            ..row("SKIP", skipped.symbol.to_string())
        });
    }

    for position in report.positions_before.positions.values() {
        rows.push(ReportRow {
            cmp: Some(position.current_price),
            pnl_pct: Some(position.unrealized_pnl_pct),
            quantity: Some(position.total_qty),
            detail: format!(
                "avg {:.2} over {} lot(s)",
                position.weighted_avg_entry, position.lots
            ),
            ..row("HOLDING", position.symbol.to_string())
        });
    }

    for sell in &report.sells {
        rows.push(ReportRow {
            pnl_pct: Some(sell.pnl_pct),
            ..row("SELL", sell.symbol.to_string())
        });
    }

    for order in &report.orders {
        rows.push(ReportRow {
            cmp: Some(order.reference_price),
            quantity: Some(order.quantity),
            detail: format!("{} {:.2}", order.kind, order.investment),
            ..row("ORDER", order.symbol.to_string())
        });
    }

    if let BuyDecision::NoAction(reason) = &report.buy {
        rows.push(ReportRow {
            detail: reason.to_string(),
            ..row("NO_ACTION", String::new())
        });
    }

    for failure in &report.failures {
        rows.push(ReportRow {
            detail: failure.to_string(),
            ..row("FAILURE", failure.symbol().to_string())
        });
    }

    rows
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &CycleReport, output_path: &str) -> Result<(), NiftyShopError> {
        let report_err = |e: csv::Error| NiftyShopError::Report {
            reason: format!("failed to write {}: {}", output_path, e),
        };

        let mut wtr = csv::Writer::from_path(output_path).map_err(report_err)?;
        for row in report_rows(report) {
            wtr.serialize(row).map_err(report_err)?;
        }
        wtr.flush().map_err(|e| NiftyShopError::Report {
            reason: format!("failed to flush {}: {}", output_path, e),
        })?;
        Ok(())
    }
}
