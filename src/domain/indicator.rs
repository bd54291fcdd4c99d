//! Simple Moving Average over closing prices.
//!
//! SMA(n)[i] = sum(C[i-j] for j in 0..n) / n
//! Warmup: first (n-1) points are invalid. A window containing a non-finite
//! close is invalid as well.

use crate::domain::price_series::PricePoint;
use chrono::NaiveDate;

/// Period of the moving average the strategy screens against.
pub const DMA_PERIOD: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

pub fn calculate_sma(points: &[PricePoint], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 {
        return Vec::new();
    }

    let mut values = Vec::with_capacity(points.len());
    let warmup = period - 1;

    for i in 0..points.len() {
        let date = points[i].date;
        let window_ok = i >= warmup && points[i - warmup..=i].iter().all(|p| p.is_valid());

        let value = if window_ok {
            points[i - warmup..=i].iter().map(|p| p.close).sum::<f64>() / period as f64
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            date,
            valid: window_ok,
            value,
        });
    }

    values
}

/// SMA at the last point, or `None` when it is still warming up or invalid.
pub fn latest_sma(points: &[PricePoint], period: usize) -> Option<f64> {
    calculate_sma(points, period)
        .last()
        .filter(|p| p.valid)
        .map(|p| p.value)
}
