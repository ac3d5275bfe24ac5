//! Present-value and rate-shock functionality.
//!
//! PV is computed with discrete per-period compounding: a flow of amount
//! `CF` at period `t` is worth `CF / (1 + r_t)^t`, where `r_t` is the curve
//! rate resolved for `t`.

use rust_decimal::{Decimal, MathematicalOps};

use crate::error::{EngineError, EngineResult};
use crate::models::{CashFlowSeries, CurvePoint, DiscountCurve, ShockScenario};

/// Returns the compounding factor `(1 + rate)^period`.
///
/// Period 0 is exactly 1 whatever the rate.
///
/// # Errors
///
/// Returns `CalculationError` if `1 + rate` is not positive or the power
/// overflows.
pub fn compounding_factor(rate: Decimal, period: u32) -> EngineResult<Decimal> {
    if period == 0 {
        return Ok(Decimal::ONE);
    }

    let growth = Decimal::ONE
        .checked_add(rate)
        .ok_or_else(|| EngineError::CalculationError {
            message: format!("rate {} gives an unrepresentable growth factor", rate),
        })?;
    if growth <= Decimal::ZERO {
        return Err(EngineError::CalculationError {
            message: format!("rate {} gives a non-positive growth factor", rate),
        });
    }

    growth
        .checked_powi(i64::from(period))
        .ok_or_else(|| EngineError::CalculationError {
            message: format!("compounding overflow for rate {} over {} periods", rate, period),
        })
}

/// Computes the present value of a cash-flow series on a discount curve.
///
/// # Errors
///
/// - `CurrencyMismatch` if a flow is not in the curve's currency
/// - `CurveGap` if the curve cannot resolve a rate for a flow's period
/// - `CalculationError` on arithmetic overflow
///
/// # Examples
///
/// ```
/// use irrbb_validation::models::{CashFlow, CashFlowSeries, CurveGapPolicy, DiscountCurve};
/// use irrbb_validation::numeric::present_value;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let curve = DiscountCurve::flat("EUR", &[1, 2], Decimal::from_str("0.05").unwrap(), CurveGapPolicy::Strict).unwrap();
/// let flows = CashFlowSeries::new(vec![CashFlow {
///     instrument_id: "loan_001".to_string(),
///     period: 2,
///     amount: Decimal::from_str("110.25").unwrap(),
///     currency: "EUR".to_string(),
/// }]);
///
/// assert_eq!(present_value(&flows, &curve).unwrap(), Decimal::from(100));
/// ```
pub fn present_value(cash_flows: &CashFlowSeries, curve: &DiscountCurve) -> EngineResult<Decimal> {
    let mut total = Decimal::ZERO;

    for flow in cash_flows.iter() {
        if flow.currency != curve.currency() {
            return Err(EngineError::CurrencyMismatch {
                instrument_id: flow.instrument_id.clone(),
                flow_currency: flow.currency.clone(),
                curve_currency: curve.currency().to_string(),
            });
        }

        // Period 0 is undiscounted and needs no curve rate.
        let rate = if flow.period == 0 {
            Decimal::ZERO
        } else {
            curve.resolve_rate(flow.period)?
        };
        let factor = compounding_factor(rate, flow.period)?;

        let discounted =
            flow.amount
                .checked_div(factor)
                .ok_or_else(|| EngineError::CalculationError {
                    message: format!(
                        "cannot discount {} at period {} for instrument '{}'",
                        flow.amount, flow.period, flow.instrument_id
                    ),
                })?;

        total = total
            .checked_add(discounted)
            .ok_or_else(|| EngineError::CalculationError {
                message: "present value overflow".to_string(),
            })?;
    }

    Ok(total)
}

/// Applies a shock scenario to a curve, adding deltas tenor by tenor.
///
/// Curve tenors the scenario does not mention are left unchanged. The
/// shocked curve keeps the currency and gap policy of the base curve.
///
/// # Errors
///
/// - `UnknownTenor` if the scenario shocks a tenor that is not on the curve
/// - `InvalidCurve` if a shocked rate leaves `1 + rate` non-positive
pub fn apply_shock(curve: &DiscountCurve, scenario: &ShockScenario) -> EngineResult<DiscountCurve> {
    if let Some(&tenor) = scenario.deltas.keys().find(|&&t| !curve.has_tenor(t)) {
        return Err(EngineError::UnknownTenor {
            scenario: scenario.name.clone(),
            tenor,
        });
    }

    let shocked = curve
        .points()
        .iter()
        .map(|p| CurvePoint::new(p.tenor, p.rate + scenario.delta_at(p.tenor)))
        .collect();

    DiscountCurve::new(curve.currency(), shocked, curve.gap_policy())
}
