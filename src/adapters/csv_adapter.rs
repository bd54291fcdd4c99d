//! CSV directory market data adapter.
//!
//! Layout under `base_path`:
//! - `<SYMBOL>.csv`: daily history with at least `Date` and `Close` columns
//!   (matched case-insensitively; other columns are ignored)
//! - `<index>.csv`: index constituents with a `Symbol` column
//!
//! Quotes are the latest valid close, bounded by the cycle date when one is
//! set with [`CsvAdapter::with_as_of`].

use crate::domain::error::NiftyShopError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::domain::symbol::Symbol;
use crate::ports::data_port::DataPort;
use crate::ports::quote_port::QuotePort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
    as_of: Option<NaiveDate>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            as_of: None,
        }
    }

    /// Quotes ignore rows dated after `as_of`.
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    fn price_path(&self, symbol: &Symbol) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn index_path(&self, index: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", index))
    }

    /// Every point in the symbol's file, or `None` when there is no file.
    fn read_points(&self, symbol: &Symbol) -> Result<Option<Vec<PricePoint>>, NiftyShopError> {
        let path = self.price_path(symbol);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| NiftyShopError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| NiftyShopError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let date_col = column_index(headers, "date").ok_or_else(|| NiftyShopError::Data {
            reason: format!("missing Date column in {}", path.display()),
        })?;
        let close_col = column_index(headers, "close").ok_or_else(|| NiftyShopError::Data {
            reason: format!("missing Close column in {}", path.display()),
        })?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| NiftyShopError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_col).unwrap_or_default();
            let date = parse_date(date_str).ok_or_else(|| NiftyShopError::Data {
                reason: format!("invalid date '{}' in {}", date_str, path.display()),
            })?;

            // a blank or unparsable close is kept as an invalid point
            let close = record
                .get(close_col)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN);

            points.push(PricePoint { date, close });
        }

        Ok(Some(points))
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl DataPort for CsvAdapter {
    fn fetch_history(
        &self,
        symbol: &Symbol,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<PriceSeries>, NiftyShopError> {
        let Some(points) = self.read_points(symbol)? else {
            return Ok(None);
        };

        let in_range: Vec<PricePoint> = points
            .into_iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .collect();

        Ok(Some(PriceSeries::new(symbol.clone(), in_range)))
    }

    fn list_symbols(&self, index: &str) -> Result<Vec<Symbol>, NiftyShopError> {
        let path = self.index_path(index);
        let content = fs::read_to_string(&path).map_err(|e| NiftyShopError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| NiftyShopError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let symbol_col = column_index(headers, "symbol").ok_or_else(|| NiftyShopError::Data {
            reason: format!("missing Symbol column in {}", path.display()),
        })?;

        let mut symbols = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| NiftyShopError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            if let Some(value) = record.get(symbol_col).map(str::trim).filter(|v| !v.is_empty()) {
                symbols.push(Symbol::from(value));
            }
        }

        Ok(symbols)
    }
}

impl QuotePort for CsvAdapter {
    /// Latest valid close on or before the cycle date.
    fn current_price(&self, symbol: &Symbol) -> Result<Option<f64>, NiftyShopError> {
        let Some(points) = self.read_points(symbol)? else {
            return Ok(None);
        };
        let series = PriceSeries::new(symbol.clone(), points);
        Ok(series
            .points()
            .iter()
            .rev()
            .filter(|p| self.as_of.is_none_or(|as_of| p.date <= as_of))
            .find(|p| p.is_valid())
            .map(|p| p.close))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "Date,Open,High,Low,Close,Volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-18,115.0,118.0,111.0,,0\n";

        fs::write(path.join("TCS.NS.csv"), csv_content).unwrap();
        fs::write(path.join("INFY.NS.csv"), "date,close\n").unwrap();
        fs::write(path.join("BAD.NS.csv"), "Day,Price\n2024-01-15,1\n").unwrap();
        fs::write(
            path.join("nifty50.csv"),
            "Symbol,Name\nTCS.NS,Tata Consultancy\nINFY.NS,Infosys\n,\n",
        )
        .unwrap();

        (dir, path)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fetch_history_sorts_and_reads_close() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter
            .fetch_history(&"TCS.NS".into(), date(2024, 1, 15), date(2024, 1, 17))
            .unwrap()
            .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.points()[0].date, date(2024, 1, 15));
        assert_eq!(series.points()[0].close, 105.0);
        assert_eq!(series.points()[2].close, 115.0);
    }

    #[test]
    fn fetch_history_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter
            .fetch_history(&"TCS.NS".into(), date(2024, 1, 16), date(2024, 1, 16))
            .unwrap()
            .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series.points()[0].date, date(2024, 1, 16));
    }

    #[test]
    fn blank_close_is_invalid_point() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter
            .fetch_history(&"TCS.NS".into(), date(2024, 1, 1), date(2024, 1, 31))
            .unwrap()
            .unwrap();

        assert_eq!(series.len(), 4);
        assert_eq!(series.valid_closes(), 3);
    }

    #[test]
    fn missing_file_is_absent() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter
            .fetch_history(&"XYZ.NS".into(), date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn header_only_file_is_empty_series() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter
            .fetch_history(&"INFY.NS".into(), date(2024, 1, 1), date(2024, 1, 31))
            .unwrap()
            .unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn missing_columns_is_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_history(&"BAD.NS".into(), date(2024, 1, 1), date(2024, 1, 31));
        assert!(matches!(result, Err(NiftyShopError::Data { .. })));
    }

    #[test]
    fn list_symbols_reads_index_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let symbols = adapter.list_symbols("nifty50").unwrap();
        assert_eq!(symbols, vec![Symbol::from("TCS.NS"), Symbol::from("INFY.NS")]);
    }

    #[test]
    fn list_symbols_missing_index_is_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.list_symbols("sensex").is_err());
    }

    #[test]
    fn current_price_is_latest_valid_close() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(adapter.current_price(&"TCS.NS".into()).unwrap(), Some(115.0));
        assert_eq!(adapter.current_price(&"INFY.NS".into()).unwrap(), None);
        assert_eq!(adapter.current_price(&"XYZ.NS".into()).unwrap(), None);
    }

    #[test]
    fn current_price_ignores_rows_after_as_of() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path.clone()).with_as_of(date(2024, 1, 16));
        assert_eq!(adapter.current_price(&"TCS.NS".into()).unwrap(), Some(110.0));

        let adapter = CsvAdapter::new(path).with_as_of(date(2024, 1, 10));
        assert_eq!(adapter.current_price(&"TCS.NS".into()).unwrap(), None);
    }

    #[test]
    fn parse_date_accepts_timestamp_suffix() {
        assert_eq!(parse_date("2024-01-15 00:00:00+05:30"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("15/01/2024"), None);
    }
}
