//! Collateral ratio sources.
//!
//! The ratio is the fraction of a burn's value paid out as collateral; the
//! rest is paid in the governance asset. It is an input owned by whatever
//! controls monetary policy, so the engine only reads it through
//! [`CollateralRatioPolicy`] and re-checks the range on every read.

use rust_decimal::Decimal;

use matrix_common::{MatrixError, Result};

/// Supplies the present target collateral ratio.
pub trait CollateralRatioPolicy {
    fn current_ratio(&self) -> Decimal;
}

/// Accept `ratio` only if it lies in [0, 1].
pub fn validate_ratio(ratio: Decimal) -> Result<Decimal> {
    if ratio < Decimal::ZERO || ratio > Decimal::ONE {
        return Err(MatrixError::InvalidRatio(format!(
            "{ratio} is outside [0, 1]"
        )));
    }
    Ok(ratio)
}

/// A ratio that never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCollateralRatio(Decimal);

impl FixedCollateralRatio {
    pub fn new(ratio: Decimal) -> Result<Self> {
        validate_ratio(ratio).map(Self)
    }
}

impl CollateralRatioPolicy for FixedCollateralRatio {
    fn current_ratio(&self) -> Decimal {
        self.0
    }
}

/// A ratio replaced from outside, e.g. by a governance proposal or a
/// stability controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernedCollateralRatio {
    ratio: Decimal,
}

impl GovernedCollateralRatio {
    pub fn new(ratio: Decimal) -> Result<Self> {
        Ok(Self {
            ratio: validate_ratio(ratio)?,
        })
    }

    pub fn set_ratio(&mut self, ratio: Decimal) -> Result<()> {
        self.ratio = validate_ratio(ratio)?;
        tracing::info!(ratio = %self.ratio, "Collateral ratio updated");
        Ok(())
    }
}

impl CollateralRatioPolicy for GovernedCollateralRatio {
    fn current_ratio(&self) -> Decimal {
        self.ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(validate_ratio(dec!(0)).is_ok());
        assert!(validate_ratio(dec!(1)).is_ok());
        assert!(validate_ratio(dec!(0.5)).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_matches!(validate_ratio(dec!(1.000001)), Err(MatrixError::InvalidRatio(_)));
        assert_matches!(validate_ratio(dec!(-0.1)), Err(MatrixError::InvalidRatio(_)));
        assert_matches!(FixedCollateralRatio::new(dec!(2)), Err(MatrixError::InvalidRatio(_)));
    }

    #[test]
    fn test_governed_ratio_keeps_old_value_on_bad_update() {
        let mut ratio = GovernedCollateralRatio::new(dec!(0.9)).unwrap();
        ratio.set_ratio(dec!(0.8)).unwrap();
        assert_eq!(ratio.current_ratio(), dec!(0.8));

        assert!(ratio.set_ratio(dec!(1.5)).is_err());
        assert_eq!(ratio.current_ratio(), dec!(0.8));
    }
}
