//! Order placement port.

use crate::domain::error::NiftyShopError;
use crate::domain::order::EntryOrder;
use crate::domain::trade::Trade;

pub trait BrokerPort {
    fn place_entry_order(&self, order: &EntryOrder) -> Result<(), NiftyShopError>;

    /// Full exit of one lot.
    fn square_off(&self, trade: &Trade) -> Result<(), NiftyShopError>;
}
