//! Burn and mint arithmetic.
//!
//! All values are 18-decimal fixed point. `collateral_equivalent` and
//! `governance_value` are kept in atto units of collateral so the split
//! between the two payout legs is exact: the governance leg is the remainder
//! of a subtraction, not a second multiplication.
//!
//! Burns round every division down (the protocol never pays out more than
//! the burned value). Mints round up (the protocol never takes less than the
//! minted value).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matrix_common::fixed::{self, ATTO};
use matrix_common::{MatrixError, Result};

use crate::ratio::validate_ratio;

/// 10^36: scales an integer amount divided by an atto price back to atto.
const ATTO_SQUARED: u128 = ATTO * ATTO;

/// Payout of a burn, in base units unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BurnBreakdown {
    /// Total payout value in collateral, atto units.
    pub collateral_equivalent: u128,
    /// Collateral returned directly.
    pub collateral: u128,
    /// Remainder still owed, collateral-denominated, atto units.
    pub governance_value: u128,
    /// Governance asset minted for the remainder.
    pub gov: u128,
}

/// What a mint takes from the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MintRequirements {
    pub collateral_equivalent: u128,
    pub collateral: u128,
    pub governance_value: u128,
    pub gov: u128,
}

fn price_atto(price: Decimal, what: &str) -> Result<u128> {
    match fixed::to_atto(price) {
        Some(atto) if atto > 0 => Ok(atto),
        _ => Err(MatrixError::InvalidPrice(format!(
            "{what} price must be positive, got {price}"
        ))),
    }
}

fn ratio_atto(ratio: Decimal) -> Result<u128> {
    let ratio = validate_ratio(ratio)?;
    fixed::to_atto(ratio).ok_or(MatrixError::ArithmeticOverflow("collateral ratio"))
}

/// Split a burn of `stable` units into collateral and governance payouts.
///
/// `coll_price` is stable per collateral unit, `gov_price` is collateral per
/// governance unit. A zero burn returns zeros without reading the prices.
pub fn compute_burn(
    stable: u128,
    coll_price: Decimal,
    gov_price: Decimal,
    ratio: Decimal,
) -> Result<BurnBreakdown> {
    if stable == 0 {
        return Ok(BurnBreakdown::default());
    }

    let coll_price = price_atto(coll_price, "collateral")?;
    let gov_price = price_atto(gov_price, "governance")?;
    let ratio = ratio_atto(ratio)?;

    let collateral_equivalent = fixed::mul_div_floor(stable, ATTO_SQUARED, coll_price)
        .ok_or(MatrixError::ArithmeticOverflow("collateral equivalent"))?;
    let collateral = fixed::mul_div_floor(collateral_equivalent, ratio, ATTO_SQUARED)
        .ok_or(MatrixError::ArithmeticOverflow("collateral portion"))?;
    let governance_value = collateral
        .checked_mul(ATTO)
        .and_then(|paid| collateral_equivalent.checked_sub(paid))
        .ok_or(MatrixError::ArithmeticOverflow("governance value"))?;
    let gov = governance_value / gov_price;

    Ok(BurnBreakdown {
        collateral_equivalent,
        collateral,
        governance_value,
        gov,
    })
}

/// Collateral and governance asset needed to mint `stable` units.
pub fn compute_mint(
    stable: u128,
    coll_price: Decimal,
    gov_price: Decimal,
    ratio: Decimal,
) -> Result<MintRequirements> {
    if stable == 0 {
        return Ok(MintRequirements::default());
    }

    let coll_price = price_atto(coll_price, "collateral")?;
    let gov_price = price_atto(gov_price, "governance")?;
    let ratio = ratio_atto(ratio)?;

    let collateral_equivalent = fixed::mul_div_ceil(stable, ATTO_SQUARED, coll_price)
        .ok_or(MatrixError::ArithmeticOverflow("collateral equivalent"))?;
    let collateral_value = fixed::mul_div_ceil(collateral_equivalent, ratio, ATTO)
        .ok_or(MatrixError::ArithmeticOverflow("collateral value"))?;
    // ratio <= 1, so ATTO - ratio cannot underflow
    let governance_value = fixed::mul_div_ceil(collateral_equivalent, ATTO - ratio, ATTO)
        .ok_or(MatrixError::ArithmeticOverflow("governance value"))?;

    Ok(MintRequirements {
        collateral_equivalent,
        collateral: collateral_value.div_ceil(ATTO),
        governance_value,
        gov: governance_value.div_ceil(gov_price),
    })
}
