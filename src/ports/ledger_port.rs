//! Trade ledger port.

use crate::domain::error::NiftyShopError;
use crate::domain::trade::Trade;

pub trait LedgerPort {
    /// Every trade recorded for `strategy`, active and closed.
    fn list_trades(&self, strategy: &str) -> Result<Vec<Trade>, NiftyShopError>;
}
