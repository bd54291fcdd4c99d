//! Market data access port: price history and index constituents.

use crate::domain::error::NiftyShopError;
use crate::domain::price_series::PriceSeries;
use crate::domain::symbol::Symbol;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily closes for `symbol` between `start_date` and `end_date`
    /// inclusive. `Ok(None)` means the provider has nothing for the symbol.
    fn fetch_history(
        &self,
        symbol: &Symbol,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<PriceSeries>, NiftyShopError>;

    /// Constituents of the named index.
    fn list_symbols(&self, index: &str) -> Result<Vec<Symbol>, NiftyShopError>;
}
