//! Difference and tolerance helpers.

use rust_decimal::Decimal;

/// Floor applied to the denominator of [`relative_difference`] (1e-8).
pub const RELATIVE_DIFF_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// Returns `|a - b|`, or `None` if it exceeds the `Decimal` range.
pub fn absolute_difference(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_sub(b).map(|diff| diff.abs())
}

/// Returns `|a - b| / max(|b|, 1e-8)`, or `None` if it exceeds the `Decimal`
/// range.
///
/// `b` is the reference value. Flooring the denominator keeps the result
/// defined when the reference is zero.
///
/// # Examples
///
/// ```
/// use irrbb_validation::numeric::relative_difference;
/// use rust_decimal::Decimal;
///
/// assert_eq!(relative_difference(Decimal::ZERO, Decimal::ZERO), Some(Decimal::ZERO));
/// assert_eq!(
///     relative_difference(Decimal::from(90), Decimal::from(100)),
///     Some(Decimal::new(1, 1))
/// );
///
/// let huge = Decimal::from_i128_with_scale(1_000_000_000_000_000_000_000, 0);
/// assert_eq!(relative_difference(huge, Decimal::ZERO), None);
/// ```
pub fn relative_difference(a: Decimal, b: Decimal) -> Option<Decimal> {
    let denominator = b.abs().max(RELATIVE_DIFF_EPSILON);
    absolute_difference(a, b)?.checked_div(denominator)
}

/// Returns true when `diff <= tolerance`; the boundary passes.
pub fn within_tolerance(diff: Decimal, tolerance: Decimal) -> bool {
    diff <= tolerance
}
