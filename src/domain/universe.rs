//! Screening universe.
//!
//! Resolves index constituents through the data port and falls back to a
//! static NIFTY 50 list when the provider fails or returns nothing.

use crate::domain::symbol::Symbol;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;
use tracing::{info, warn};

pub const DEFAULT_INDEX: &str = "nifty50";

pub const NIFTY50_FALLBACK: [&str; 50] = [
    "RELIANCE.NS",
    "TCS.NS",
    "HDFCBANK.NS",
    "ICICIBANK.NS",
    "INFY.NS",
    "HINDUNILVR.NS",
    "BHARTIARTL.NS",
    "ITC.NS",
    "SBIN.NS",
    "LICI.NS",
    "BAJFINANCE.NS",
    "HCLTECH.NS",
    "KOTAKBANK.NS",
    "MARUTI.NS",
    "LT.NS",
    "ASIANPAINT.NS",
    "AXISBANK.NS",
    "SUNPHARMA.NS",
    "WIPRO.NS",
    "ULTRACEMCO.NS",
    "NESTLEIND.NS",
    "BAJAJFINSV.NS",
    "ADANIENT.NS",
    "NTPC.NS",
    "M&M.NS",
    "JSWSTEEL.NS",
    "TATAMOTORS.NS",
    "POWERGRID.NS",
    "TITAN.NS",
    "TATASTEEL.NS",
    "ADANIPORTS.NS",
    "COALINDIA.NS",
    "ONGC.NS",
    "INDUSINDBK.NS",
    "HINDALCO.NS",
    "BRITANNIA.NS",
    "CIPLA.NS",
    "DRREDDY.NS",
    "EICHERMOT.NS",
    "GRASIM.NS",
    "HEROMOTOCO.NS",
    "BPCL.NS",
    "DIVISLAB.NS",
    "BAJAJ-AUTO.NS",
    "APOLLOHOSP.NS",
    "TECHM.NS",
    "UPL.NS",
    "SHREECEM.NS",
    "HDFCLIFE.NS",
    "TATACONSUM.NS",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniverseSource {
    Provider,
    /// Explicit list from configuration.
    Configured,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Universe {
    pub symbols: Vec<Symbol>,
    pub index: String,
    pub source: UniverseSource,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.symbols.len()
    }

    pub fn configured(index: &str, symbols: Vec<Symbol>) -> Self {
        Universe {
            symbols,
            index: index.to_string(),
            source: UniverseSource::Configured,
        }
    }

    pub fn fallback(index: &str) -> Self {
        Universe {
            symbols: NIFTY50_FALLBACK.iter().map(|&s| Symbol::from(s)).collect(),
            index: index.to_string(),
            source: UniverseSource::Fallback,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parses a comma separated symbol list, upper-casing each entry.
pub fn parse_symbols(input: &str) -> Result<Vec<Symbol>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(Symbol::from(symbol));
    }

    Ok(symbols)
}

/// Constituents of `index` from the provider, de-duplicated in provider
/// order. Never fails: a provider error or an empty list yields the static
/// fallback.
pub fn resolve_universe(data_port: &dyn DataPort, index: &str) -> Universe {
    match data_port.list_symbols(index) {
        Ok(listed) => {
            let mut seen = HashSet::new();
            let symbols: Vec<Symbol> = listed
                .into_iter()
                .filter(|s| !s.as_str().trim().is_empty())
                .filter(|s| seen.insert(s.clone()))
                .collect();

            if symbols.is_empty() {
                warn!(index, "provider returned no symbols, using static fallback list");
                return Universe::fallback(index);
            }

            info!(index, count = symbols.len(), "resolved universe");
            Universe {
                symbols,
                index: index.to_string(),
                source: UniverseSource::Provider,
            }
        }
        Err(e) => {
            warn!(index, error = %e, "universe lookup failed, using static fallback list");
            Universe::fallback(index)
        }
    }
}
