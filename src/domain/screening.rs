//! Deviation-from-20DMA screening.
//!
//! Every symbol of the universe is scored by how far its latest close sits
//! below its 20-day simple moving average:
//!
//! deviation% = (close - SMA20) / SMA20 * 100
//!
//! Only symbols trading below their average are eligible. The eligible set is
//! ranked most-negative first and truncated to the top K. Per-symbol data
//! problems never abort the batch; they are reported as [`SkippedSymbol`]s.

use crate::domain::indicator::{DMA_PERIOD, latest_sma};
use crate::domain::price_series::PriceSeries;
use crate::domain::symbol::Symbol;
use crate::ports::data_port::DataPort;
use chrono::{Duration, NaiveDate};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenConfig {
    pub lookback_days: i64,
    pub top_k: usize,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            lookback_days: 50,
            top_k: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenedStock {
    pub symbol: Symbol,
    pub deviation_pct: f64,
    pub close: f64,
    pub dma: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    FetchFailed(String),
    NoData,
    InsufficientData { valid_closes: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchFailed(reason) => write!(f, "fetch failed: {}", reason),
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InsufficientData { valid_closes } => write!(
                f,
                "only {} valid closes, {} required",
                valid_closes, DMA_PERIOD
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: Symbol,
    pub reason: SkipReason,
}

/// Result of evaluating one symbol's history.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    BelowAverage(ScreenedStock),
    AtOrAboveAverage,
}

#[derive(Debug, Clone, Default)]
pub struct ScreeningReport {
    /// Top-K eligible symbols, most negative deviation first.
    pub candidates: Vec<ScreenedStock>,
    pub above_average: Vec<Symbol>,
    pub skipped: Vec<SkippedSymbol>,
    /// Eligible symbols before truncation.
    pub eligible_count: usize,
}

impl ScreeningReport {
    pub fn symbols(&self) -> Vec<Symbol> {
        self.candidates.iter().map(|c| c.symbol.clone()).collect()
    }
}

/// Scores one series against its 20DMA.
pub fn evaluate(series: &PriceSeries) -> Result<Evaluation, SkipReason> {
    if series.is_empty() {
        return Err(SkipReason::NoData);
    }

    // counted over the averaging window, not the whole lookback
    let points = series.points();
    let window = &points[points.len().saturating_sub(DMA_PERIOD)..];
    let insufficient = || SkipReason::InsufficientData {
        valid_closes: window.iter().filter(|p| p.is_valid()).count(),
    };

    let dma = latest_sma(points, DMA_PERIOD).ok_or_else(insufficient)?;
    let close = series.latest().map(|p| p.close).ok_or(SkipReason::NoData)?;
    if !close.is_finite() || dma == 0.0 {
        return Err(insufficient());
    }

    if close >= dma {
        return Ok(Evaluation::AtOrAboveAverage);
    }

    Ok(Evaluation::BelowAverage(ScreenedStock {
        symbol: series.symbol().clone(),
        deviation_pct: (close - dma) / dma * 100.0,
        close,
        dma,
    }))
}

/// Orders by ascending deviation, ties broken by symbol.
pub fn rank(candidates: &mut [ScreenedStock]) {
    candidates.sort_by(|a, b| {
        a.deviation_pct
            .partial_cmp(&b.deviation_pct)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}

pub fn screen(
    data_port: &dyn DataPort,
    universe: &[Symbol],
    as_of: NaiveDate,
    config: &ScreenConfig,
) -> ScreeningReport {
    let start_date = Duration::try_days(config.lookback_days)
        .and_then(|window| as_of.checked_sub_signed(window))
        .unwrap_or(NaiveDate::MIN);
    let mut report = ScreeningReport::default();

    for symbol in universe {
        let series = match data_port.fetch_history(symbol, start_date, as_of) {
            Ok(Some(series)) => series,
            Ok(None) => {
                debug!(symbol = %symbol, "no price history");
                report.skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::NoData,
                });
                continue;
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol, history fetch failed");
                report.skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
                continue;
            }
        };

        match evaluate(&series) {
            Ok(Evaluation::BelowAverage(stock)) => {
                debug!(symbol = %symbol, deviation = stock.deviation_pct, "below 20DMA");
                report.candidates.push(stock);
            }
            Ok(Evaluation::AtOrAboveAverage) => report.above_average.push(symbol.clone()),
            Err(reason) => {
                debug!(symbol = %symbol, reason = %reason, "skipping symbol");
                report.skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason,
                });
            }
        }
    }

    report.eligible_count = report.candidates.len();
    rank(&mut report.candidates);
    report.candidates.truncate(config.top_k);

    info!(
        screened = universe.len(),
        eligible = report.eligible_count,
        skipped = report.skipped.len(),
        selected = report.candidates.len(),
        "screening complete"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_series::PricePoint;
    use approx::assert_relative_eq;

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceSeries::new(
            symbol.into(),
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PricePoint {
                    date: start + Duration::days(i as i64),
                    close,
                })
                .collect(),
        )
    }

    fn flat_then(last: f64) -> Vec<f64> {
        let mut closes = vec![100.0; 19];
        closes.push(last);
        closes
    }

    #[test]
    fn evaluate_below_average() {
        // SMA = (19*100 + 81) / 20 = 99.05
        let result = evaluate(&series("TCS.NS", &flat_then(81.0))).unwrap();
        match result {
            Evaluation::BelowAverage(stock) => {
                assert_relative_eq!(stock.dma, 99.05);
                assert_relative_eq!(stock.close, 81.0);
                assert_relative_eq!(stock.deviation_pct, (81.0 - 99.05) / 99.05 * 100.0);
                assert!(stock.deviation_pct < 0.0);
            }
            other => panic!("expected BelowAverage, got {:?}", other),
        }
    }

    #[test]
    fn evaluate_at_average_is_not_eligible() {
        let result = evaluate(&series("TCS.NS", &[100.0; 20])).unwrap();
        assert_eq!(result, Evaluation::AtOrAboveAverage);
    }

    #[test]
    fn evaluate_above_average() {
        let result = evaluate(&series("TCS.NS", &flat_then(120.0))).unwrap();
        assert_eq!(result, Evaluation::AtOrAboveAverage);
    }

    #[test]
    fn evaluate_short_history() {
        let result = evaluate(&series("TCS.NS", &[100.0; 19]));
        assert_eq!(result, Err(SkipReason::InsufficientData { valid_closes: 19 }));
    }

    #[test]
    fn evaluate_nan_in_window() {
        let mut closes = flat_then(90.0);
        closes[10] = f64::NAN;
        let result = evaluate(&series("TCS.NS", &closes));
        assert_eq!(result, Err(SkipReason::InsufficientData { valid_closes: 19 }));
    }

    #[test]
    fn evaluate_counts_valid_closes_in_window_only() {
        let mut closes = vec![100.0; 40];
        closes[35] = f64::NAN;
        let result = evaluate(&series("TCS.NS", &closes));
        assert_eq!(result, Err(SkipReason::InsufficientData { valid_closes: 19 }));
    }

    #[test]
    fn evaluate_empty() {
        assert_eq!(evaluate(&series("TCS.NS", &[])), Err(SkipReason::NoData));
    }

    #[test]
    fn rank_orders_most_negative_first_with_symbol_tiebreak() {
        let mk = |s: &str, d: f64| ScreenedStock {
            symbol: s.into(),
            deviation_pct: d,
            close: 0.0,
            dma: 0.0,
        };
        let mut stocks = vec![mk("C", -1.0), mk("B", -5.0), mk("A", -5.0), mk("D", -3.0)];
        rank(&mut stocks);
        let order: Vec<&str> = stocks.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "D", "C"]);
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(
            SkipReason::InsufficientData { valid_closes: 12 }.to_string(),
            "only 12 valid closes, 20 required"
        );
    }
}
