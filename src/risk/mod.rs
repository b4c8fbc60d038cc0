//! Take-profit / stop-loss classification.
//!
//! Pure functions over price and cost basis; fetching either is the
//! caller's job. Both thresholds are inclusive, and a position that cannot
//! be priced is reported as such rather than assumed safe.

use crate::config::ThresholdsConfig;
use rust_decimal::Decimal;

/// TP/SL exit thresholds as price/cost ratios.
#[derive(Debug, Clone, Copy)]
pub struct RiskThresholds {
    /// Exit at or above this ratio
    pub take_profit_ratio: Decimal,
    /// Exit at or below this ratio
    pub stop_loss_ratio: Decimal,
}

impl From<&ThresholdsConfig> for RiskThresholds {
    fn from(config: &ThresholdsConfig) -> Self {
        Self {
            take_profit_ratio: config.take_profit_ratio,
            stop_loss_ratio: config.stop_loss_ratio,
        }
    }
}

/// Why a position could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataReason {
    MissingCostBasis,
    MissingPrice,
    NonPositivePrice,
}

/// Outcome of checking one position against the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskVerdict {
    /// Price at or above the take-profit ratio; exit
    TakeProfit,
    /// Price at or below the stop-loss ratio; exit
    StopLoss,
    /// Between the thresholds; hold
    Safe,
    /// Unclassifiable; hold, but never report as safe
    NoData(NoDataReason),
}

impl RiskVerdict {
    /// Whether this verdict demands an immediate exit.
    pub fn requires_exit(&self) -> bool {
        matches!(self, RiskVerdict::TakeProfit | RiskVerdict::StopLoss)
    }
}

/// Classify one position given its current price and cost basis.
pub fn classify(
    thresholds: &RiskThresholds,
    price: Option<Decimal>,
    cost_basis: Option<Decimal>,
) -> RiskVerdict {
    let Some(cost) = cost_basis.filter(|c| *c > Decimal::ZERO) else {
        return RiskVerdict::NoData(NoDataReason::MissingCostBasis);
    };
    let Some(price) = price else {
        return RiskVerdict::NoData(NoDataReason::MissingPrice);
    };
    if price <= Decimal::ZERO {
        return RiskVerdict::NoData(NoDataReason::NonPositivePrice);
    }

    let ratio = price / cost;
    if ratio >= thresholds.take_profit_ratio {
        RiskVerdict::TakeProfit
    } else if ratio <= thresholds.stop_loss_ratio {
        RiskVerdict::StopLoss
    } else {
        RiskVerdict::Safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn thresholds() -> RiskThresholds {
        RiskThresholds {
            take_profit_ratio: dec!(1.06),
            stop_loss_ratio: dec!(0.97),
        }
    }

    #[test]
    fn test_take_profit_boundary_is_inclusive() {
        let verdict = classify(&thresholds(), Some(dec!(106)), Some(dec!(100)));
        assert_eq!(verdict, RiskVerdict::TakeProfit);
    }

    #[test]
    fn test_stop_loss_boundary_is_inclusive() {
        let verdict = classify(&thresholds(), Some(dec!(97)), Some(dec!(100)));
        assert_eq!(verdict, RiskVerdict::StopLoss);
    }

    #[test]
    fn test_between_thresholds_is_safe() {
        assert_eq!(
            classify(&thresholds(), Some(dec!(105.99)), Some(dec!(100))),
            RiskVerdict::Safe
        );
        assert_eq!(
            classify(&thresholds(), Some(dec!(97.01)), Some(dec!(100))),
            RiskVerdict::Safe
        );
    }

    #[test]
    fn test_missing_cost_basis_is_no_data() {
        assert_eq!(
            classify(&thresholds(), Some(dec!(100)), None),
            RiskVerdict::NoData(NoDataReason::MissingCostBasis)
        );
        assert_eq!(
            classify(&thresholds(), Some(dec!(100)), Some(Decimal::ZERO)),
            RiskVerdict::NoData(NoDataReason::MissingCostBasis)
        );
    }

    #[test]
    fn test_missing_or_bad_price_is_no_data() {
        assert_eq!(
            classify(&thresholds(), None, Some(dec!(100))),
            RiskVerdict::NoData(NoDataReason::MissingPrice)
        );
        assert_eq!(
            classify(&thresholds(), Some(Decimal::ZERO), Some(dec!(100))),
            RiskVerdict::NoData(NoDataReason::NonPositivePrice)
        );
    }

    #[test]
    fn test_no_data_never_requires_exit() {
        assert!(!RiskVerdict::NoData(NoDataReason::MissingPrice).requires_exit());
        assert!(!RiskVerdict::Safe.requires_exit());
        assert!(RiskVerdict::TakeProfit.requires_exit());
        assert!(RiskVerdict::StopLoss.requires_exit());
    }
}
