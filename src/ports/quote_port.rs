//! Current market price port.

use crate::domain::error::NiftyShopError;
use crate::domain::symbol::Symbol;

pub trait QuotePort {
    /// Last traded price, or `Ok(None)` when no quote is available.
    fn current_price(&self, symbol: &Symbol) -> Result<Option<f64>, NiftyShopError>;
}
