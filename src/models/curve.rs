//! Discount curve and shock scenario models.
//!
//! A [`DiscountCurve`] maps tenors (period counts) to per-period discount
//! rates. How the curve answers for a period that is not on its grid is
//! decided by the caller through an explicit [`CurveGapPolicy`]; the curve
//! never extrapolates on its own.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// How a curve resolves a rate for a period that is not one of its tenors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveGapPolicy {
    /// Only exact tenors resolve; anything else is a curve gap.
    #[default]
    Strict,
    /// Linear interpolation between bracketing tenors; no extrapolation.
    Linear,
    /// Linear interpolation inside the grid, flat beyond the first and last tenor.
    LinearFlatEnds,
}

/// A single (tenor, rate) node of a discount curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// The tenor in periods.
    pub tenor: u32,
    /// The per-period discount rate (0.05 = 5%).
    pub rate: Decimal,
}

impl CurvePoint {
    /// Creates a new curve point.
    pub fn new(tenor: u32, rate: Decimal) -> Self {
        Self { tenor, rate }
    }
}

/// Serialized shape of a curve, validated on conversion.
#[derive(Deserialize)]
struct CurveDefinition {
    currency: String,
    points: Vec<CurvePoint>,
    #[serde(default)]
    gap_policy: CurveGapPolicy,
}

impl TryFrom<CurveDefinition> for DiscountCurve {
    type Error = EngineError;

    fn try_from(def: CurveDefinition) -> EngineResult<Self> {
        DiscountCurve::new(def.currency, def.points, def.gap_policy)
    }
}

/// A validated discount curve.
///
/// Invariants: at least one point, tenors strictly increasing, and
/// `1 + rate > 0` for every point so that discount factors are defined.
///
/// # Example
///
/// ```
/// use irrbb_validation::models::{CurveGapPolicy, CurvePoint, DiscountCurve};
/// use rust_decimal::Decimal;
///
/// let curve = DiscountCurve::new(
///     "EUR",
///     vec![
///         CurvePoint::new(1, Decimal::new(3, 2)),
///         CurvePoint::new(5, Decimal::new(4, 2)),
///     ],
///     CurveGapPolicy::Linear,
/// )
/// .unwrap();
///
/// assert_eq!(curve.resolve_rate(3).unwrap(), Decimal::new(35, 3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CurveDefinition")]
pub struct DiscountCurve {
    currency: String,
    points: Vec<CurvePoint>,
    gap_policy: CurveGapPolicy,
}

impl DiscountCurve {
    /// Creates a curve, validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurve` if the curve is empty, its tenors are not
    /// strictly increasing, or any rate makes `1 + rate` non-positive.
    pub fn new(
        currency: impl Into<String>,
        points: Vec<CurvePoint>,
        gap_policy: CurveGapPolicy,
    ) -> EngineResult<Self> {
        let currency = currency.into();

        if points.is_empty() {
            return Err(EngineError::InvalidCurve {
                message: format!("{} curve has no points", currency),
            });
        }

        for pair in points.windows(2) {
            if pair[1].tenor <= pair[0].tenor {
                return Err(EngineError::InvalidCurve {
                    message: format!(
                        "{} curve tenors must be strictly increasing ({} then {})",
                        currency, pair[0].tenor, pair[1].tenor
                    ),
                });
            }
        }

        if let Some(point) = points.iter().find(|p| Decimal::ONE + p.rate <= Decimal::ZERO) {
            return Err(EngineError::InvalidCurve {
                message: format!(
                    "{} curve rate {} at tenor {} gives a non-positive growth factor",
                    currency, point.rate, point.tenor
                ),
            });
        }

        Ok(Self {
            currency,
            points,
            gap_policy,
        })
    }

    /// Creates a curve with the same rate at every given tenor.
    pub fn flat(
        currency: impl Into<String>,
        tenors: &[u32],
        rate: Decimal,
        gap_policy: CurveGapPolicy,
    ) -> EngineResult<Self> {
        let points = tenors.iter().map(|&t| CurvePoint::new(t, rate)).collect();
        Self::new(currency, points, gap_policy)
    }

    /// Returns the currency of the curve.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Returns the curve nodes in tenor order.
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Returns the gap policy of the curve.
    pub fn gap_policy(&self) -> CurveGapPolicy {
        self.gap_policy
    }

    /// Returns true if the tenor is a node of the curve.
    pub fn has_tenor(&self, tenor: u32) -> bool {
        self.points.binary_search_by_key(&tenor, |p| p.tenor).is_ok()
    }

    /// Resolves the rate for a period according to the gap policy.
    ///
    /// # Errors
    ///
    /// Returns `CurveGap` if the policy cannot supply a rate for the period.
    pub fn resolve_rate(&self, period: u32) -> EngineResult<Decimal> {
        let idx = match self.points.binary_search_by_key(&period, |p| p.tenor) {
            Ok(i) => return Ok(self.points[i].rate),
            Err(idx) => idx,
        };

        let gap = || EngineError::CurveGap {
            currency: self.currency.clone(),
            period,
        };

        match self.gap_policy {
            CurveGapPolicy::Strict => Err(gap()),
            CurveGapPolicy::Linear | CurveGapPolicy::LinearFlatEnds => {
                let flat_ends = self.gap_policy == CurveGapPolicy::LinearFlatEnds;
                if idx == 0 {
                    return if flat_ends { Ok(self.points[0].rate) } else { Err(gap()) };
                }
                if idx == self.points.len() {
                    return if flat_ends {
                        Ok(self.points[idx - 1].rate)
                    } else {
                        Err(gap())
                    };
                }
                Ok(interpolate(self.points[idx - 1], self.points[idx], period))
            }
        }
    }
}

fn interpolate(lower: CurvePoint, upper: CurvePoint, period: u32) -> Decimal {
    let span = Decimal::from(upper.tenor - lower.tenor);
    let offset = Decimal::from(period - lower.tenor);
    lower.rate + (upper.rate - lower.rate) * offset / span
}

/// A named additive rate shock, defined per tenor of a curve grid.
///
/// Curve tenors that the scenario does not mention are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShockScenario {
    /// The scenario name (e.g., "parallel_up").
    pub name: String,
    /// Rate delta per tenor (-0.01 = -100bp).
    pub deltas: BTreeMap<u32, Decimal>,
}

impl ShockScenario {
    /// Creates a scenario from (tenor, delta) pairs.
    pub fn new(name: impl Into<String>, deltas: impl IntoIterator<Item = (u32, Decimal)>) -> Self {
        Self {
            name: name.into(),
            deltas: deltas.into_iter().collect(),
        }
    }

    /// Creates a parallel shift of `delta` on every tenor of the curve.
    ///
    /// # Example
    ///
    /// ```
    /// use irrbb_validation::models::{CurveGapPolicy, DiscountCurve, ShockScenario};
    /// use rust_decimal::Decimal;
    ///
    /// let curve = DiscountCurve::flat("EUR", &[1, 2, 3], Decimal::new(5, 2), CurveGapPolicy::Strict).unwrap();
    /// let down = ShockScenario::parallel("parallel_down", &curve, Decimal::new(-1, 2));
    /// assert_eq!(down.deltas.len(), 3);
    /// ```
    pub fn parallel(name: impl Into<String>, curve: &DiscountCurve, delta: Decimal) -> Self {
        Self::new(name, curve.points().iter().map(|p| (p.tenor, delta)))
    }

    /// Returns the delta at a tenor, zero if the scenario does not shock it.
    pub fn delta_at(&self, tenor: u32) -> Decimal {
        self.deltas.get(&tenor).copied().unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn two_point_curve(policy: CurveGapPolicy) -> DiscountCurve {
        DiscountCurve::new(
            "EUR",
            vec![CurvePoint::new(2, dec("0.02")), CurvePoint::new(6, dec("0.04"))],
            policy,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_curve_is_rejected() {
        let result = DiscountCurve::new("EUR", vec![], CurveGapPolicy::Strict);
        assert!(matches!(result, Err(EngineError::InvalidCurve { .. })));
    }

    #[test]
    fn test_non_increasing_tenors_are_rejected() {
        let result = DiscountCurve::new(
            "EUR",
            vec![CurvePoint::new(3, dec("0.02")), CurvePoint::new(3, dec("0.03"))],
            CurveGapPolicy::Strict,
        );
        match result {
            Err(EngineError::InvalidCurve { message }) => {
                assert!(message.contains("strictly increasing"));
            }
            other => panic!("Expected InvalidCurve, got {:?}", other),
        }
    }

    #[test]
    fn test_rate_at_or_below_minus_one_is_rejected() {
        let result = DiscountCurve::new(
            "EUR",
            vec![CurvePoint::new(1, dec("-1"))],
            CurveGapPolicy::Strict,
        );
        assert!(matches!(result, Err(EngineError::InvalidCurve { .. })));
    }

    #[test]
    fn test_strict_policy_resolves_exact_tenor_only() {
        let curve = two_point_curve(CurveGapPolicy::Strict);

        assert_eq!(curve.resolve_rate(2).unwrap(), dec("0.02"));
        match curve.resolve_rate(4) {
            Err(EngineError::CurveGap { currency, period }) => {
                assert_eq!(currency, "EUR");
                assert_eq!(period, 4);
            }
            other => panic!("Expected CurveGap, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_policy_interpolates_inside_grid() {
        let curve = two_point_curve(CurveGapPolicy::Linear);

        assert_eq!(curve.resolve_rate(4).unwrap(), dec("0.03"));
        assert_eq!(curve.resolve_rate(3).unwrap(), dec("0.025"));
    }

    #[test]
    fn test_linear_policy_does_not_extrapolate() {
        let curve = two_point_curve(CurveGapPolicy::Linear);

        assert!(matches!(curve.resolve_rate(1), Err(EngineError::CurveGap { .. })));
        assert!(matches!(curve.resolve_rate(7), Err(EngineError::CurveGap { .. })));
    }

    #[test]
    fn test_flat_ends_policy_extends_first_and_last_rate() {
        let curve = two_point_curve(CurveGapPolicy::LinearFlatEnds);

        assert_eq!(curve.resolve_rate(1).unwrap(), dec("0.02"));
        assert_eq!(curve.resolve_rate(30).unwrap(), dec("0.04"));
    }

    #[test]
    fn test_deserialize_validates_curve() {
        let json = r#"{"currency": "EUR", "points": [{"tenor": 5, "rate": "0.03"}, {"tenor": 1, "rate": "0.02"}]}"#;
        let result: Result<DiscountCurve, _> = serde_json::from_str(json);
        assert!(result.is_err());

        let json = r#"{"currency": "EUR", "points": [{"tenor": 1, "rate": "0.02"}]}"#;
        let curve: DiscountCurve = serde_json::from_str(json).unwrap();
        assert_eq!(curve.gap_policy(), CurveGapPolicy::Strict);
    }

    #[test]
    fn test_parallel_scenario_covers_curve_grid() {
        let curve = two_point_curve(CurveGapPolicy::Strict);
        let scenario = ShockScenario::parallel("parallel_up", &curve, dec("0.02"));

        assert_eq!(scenario.delta_at(2), dec("0.02"));
        assert_eq!(scenario.delta_at(6), dec("0.02"));
        assert_eq!(scenario.delta_at(4), Decimal::ZERO);
    }
}
