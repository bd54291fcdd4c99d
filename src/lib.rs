//! niftyshop: the "Nifty Shop" positional equity strategy.
//!
//! Hexagonal architecture: decision logic in [`domain`], port traits for the
//! market data provider, trade ledger and broker in [`ports`], file-backed
//! implementations in [`adapters`], and the command-line front end in
//! [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
