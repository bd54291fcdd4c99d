//! Configuration validation.
//!
//! Missing strategy keys fall back to [`StrategyParams::default`]; present
//! keys must be in range.

use crate::domain::error::NiftyShopError;
use crate::domain::indicator::DMA_PERIOD;
use crate::domain::strategy::StrategyParams;
use crate::ports::config_port::ConfigPort;

/// Ten years of history is the longest screening window accepted.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), NiftyShopError> {
    let defaults = StrategyParams::default();
    validate_name(config)?;
    validate_positive(config, "investment_first_buy", defaults.investment_first_buy)?;
    validate_positive(config, "investment_averaging", defaults.investment_averaging)?;
    validate_positive(config, "target_pct", defaults.target_pct)?;
    validate_averaging_pct(config, defaults.averaging_pct)?;
    validate_at_least(config, "max_buys_per_day", defaults.max_buys_per_day as i64, 1)?;
    validate_at_least(config, "max_sells_per_day", defaults.max_sells_per_day as i64, 1)?;
    validate_at_least(
        config,
        "max_averaging_per_stock",
        defaults.max_averaging_per_stock as i64,
        1,
    )?;
    validate_at_least(config, "lookback_days", defaults.lookback_days, DMA_PERIOD as i64)?;
    validate_at_most(config, "lookback_days", defaults.lookback_days, MAX_LOOKBACK_DAYS)?;
    validate_at_least(config, "top_k", defaults.top_k as i64, 1)?;
    Ok(())
}

/// Paths a live cycle needs.
pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), NiftyShopError> {
    for key in ["price_dir", "ledger_path"] {
        match config.get_string("data", key) {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(NiftyShopError::ConfigMissing {
                    section: "data".to_string(),
                    key: key.to_string(),
                })
            }
        }
    }
    Ok(())
}

fn validate_name(config: &dyn ConfigPort) -> Result<(), NiftyShopError> {
    match config.get_string("strategy", "name") {
        Some(s) if s.trim().is_empty() => Err(NiftyShopError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "name".to_string(),
            reason: "name must not be empty".to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_positive(config: &dyn ConfigPort, key: &str, default: f64) -> Result<(), NiftyShopError> {
    let value = config.get_double("strategy", key, default);
    if !(value > 0.0) {
        return Err(NiftyShopError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: format!("{} must be positive", key),
        });
    }
    Ok(())
}

fn validate_averaging_pct(config: &dyn ConfigPort, default: f64) -> Result<(), NiftyShopError> {
    let value = config.get_double("strategy", "averaging_pct", default);
    if !(value < 0.0) {
        return Err(NiftyShopError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "averaging_pct".to_string(),
            reason: "averaging_pct must be negative".to_string(),
        });
    }
    Ok(())
}

fn validate_at_least(
    config: &dyn ConfigPort,
    key: &str,
    default: i64,
    minimum: i64,
) -> Result<(), NiftyShopError> {
    let value = config.get_int("strategy", key, default);
    if value < minimum {
        return Err(NiftyShopError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: format!("{} must be at least {}", key, minimum),
        });
    }
    Ok(())
}

fn validate_at_most(
    config: &dyn ConfigPort,
    key: &str,
    default: i64,
    maximum: i64,
) -> Result<(), NiftyShopError> {
    let value = config.get_int("strategy", key, default);
    if value > maximum {
        return Err(NiftyShopError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: format!("{} must be at most {}", key, maximum),
        });
    }
    Ok(())
}
