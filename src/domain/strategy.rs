//! Strategy parameters.

/// Tunable thresholds and limits for one Nifty Shop instance.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    /// Ledger strategy id; trades of other strategies are ignored.
    pub name: String,
    pub investment_first_buy: f64,
    pub investment_averaging: f64,
    /// Aggregate P&L% at or above which a symbol is sold.
    pub target_pct: f64,
    /// Fall from last buy price (negative %) that makes a holding eligible for averaging.
    pub averaging_pct: f64,
    pub max_buys_per_day: usize,
    pub max_sells_per_day: usize,
    pub max_averaging_per_stock: usize,
    /// Calendar days of history fetched for screening.
    pub lookback_days: i64,
    pub top_k: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            name: "NiftyShop".to_string(),
            investment_first_buy: 15_000.0,
            investment_averaging: 7_500.0,
            target_pct: 5.0,
            averaging_pct: -5.0,
            max_buys_per_day: 1,
            max_sells_per_day: 1,
            max_averaging_per_stock: 3,
            lookback_days: 50,
            top_k: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = StrategyParams::default();
        assert_eq!(p.name, "NiftyShop");
        assert_eq!(p.investment_first_buy, 15_000.0);
        assert_eq!(p.investment_averaging, 7_500.0);
        assert_eq!(p.target_pct, 5.0);
        assert_eq!(p.averaging_pct, -5.0);
        assert_eq!(p.max_buys_per_day, 1);
        assert_eq!(p.max_sells_per_day, 1);
        assert_eq!(p.max_averaging_per_stock, 3);
        assert_eq!(p.lookback_days, 50);
        assert_eq!(p.top_k, 5);
    }

    #[test]
    fn override_with_struct_update() {
        let p = StrategyParams {
            max_buys_per_day: 2,
            ..StrategyParams::default()
        };
        assert_eq!(p.max_buys_per_day, 2);
        assert_eq!(p.top_k, 5);
    }
}
