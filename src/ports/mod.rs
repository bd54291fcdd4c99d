//! Port traits for the strategy's external collaborators.

pub mod broker_port;
pub mod config_port;
pub mod data_port;
pub mod ledger_port;
pub mod quote_port;
pub mod report_port;
