//! 18-decimal fixed-point helpers.
//!
//! Prices and ratios travel as [`Decimal`]; settlement math runs on `u128`
//! "atto" integers (value × 10^18). Every conversion truncates toward zero,
//! and every multiply-then-divide goes through a 256-bit intermediate so the
//! result is the exact floor (or ceiling) of the rational value on every node.

use rust_decimal::Decimal;
use sp_arithmetic::Rounding;
use sp_arithmetic::helpers_128bit::multiply_by_rational_with_rounding;

/// Number of fractional digits carried by fixed-point values.
pub const PRECISION: u32 = 18;

/// 10^18, the fixed-point unit.
pub const ATTO: u128 = 1_000_000_000_000_000_000;

/// Truncate a decimal to [`PRECISION`] fractional digits, toward zero.
pub fn truncate(value: Decimal) -> Decimal {
    value.trunc_with_scale(PRECISION)
}

/// Convert a non-negative decimal to atto units, truncating extra digits.
///
/// Returns `None` for negative values.
pub fn to_atto(value: Decimal) -> Option<u128> {
    let truncated = truncate(value);
    let mantissa = u128::try_from(truncated.mantissa()).ok()?;
    let factor = 10u128.checked_pow(PRECISION - truncated.scale())?;
    mantissa.checked_mul(factor)
}

/// Convert atto units back to a decimal. `None` if it does not fit.
pub fn from_atto(atto: u128) -> Option<Decimal> {
    let mantissa = i128::try_from(atto).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, PRECISION)
        .ok()
        .map(|d| d.normalize())
}

/// `floor(a * b / c)`. `None` on division by zero or if the result exceeds `u128`.
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> Option<u128> {
    multiply_by_rational_with_rounding(a, b, c, Rounding::Down)
}

/// `ceil(a * b / c)`. `None` on division by zero or if the result exceeds `u128`.
pub fn mul_div_ceil(a: u128, b: u128, c: u128) -> Option<u128> {
    multiply_by_rational_with_rounding(a, b, c, Rounding::Up)
}
