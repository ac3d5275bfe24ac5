//! Instrument-level ΔPV unit tests.
//!
//! For each sampled instrument and shock scenario, the expected change in
//! present value is recomputed independently from the instrument's cash
//! flows and compared with the figure reported by the model.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::ValidationConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, CheckStatus, DiscountCurve, ModelDeltaPv, ReasonCode, SampledInstrument,
    ShockScenario, UnitTestRecord,
};
use crate::numeric::{absolute_difference, apply_shock, present_value, within_tolerance};

/// The result of running the instrument unit tests.
#[derive(Debug, Clone)]
pub struct UnitTestResult {
    /// One record per sampled (instrument, scenario) pair, in sample order.
    pub records: Vec<UnitTestRecord>,
    /// The audit step recording this check.
    pub audit_step: AuditStep,
}

/// Returns the absolute ΔPV tolerance for an instrument.
///
/// The larger of the configured absolute tolerance and the configured
/// percentage of the instrument's notional.
pub fn unit_test_tolerance(notional: Decimal, config: &ValidationConfig) -> Decimal {
    let scaled = notional.abs() * config.unit_test_tolerance_pct_notional / Decimal::ONE_HUNDRED;
    config.unit_test_tolerance_abs.max(scaled)
}

/// Recomputes ΔPV for each sampled pair and compares it to the model's figure.
///
/// `manual ΔPV = PV(cash flows, shocked curve) - PV(cash flows, base curve)`.
///
/// A pair without a model figure fails with [`ReasonCode::MissingModelOutput`];
/// a pair naming a scenario that was not supplied fails with
/// [`ReasonCode::UnknownScenario`]. An instrument that cannot be valued
/// (`CurveGap`, `CurrencyMismatch`, overflow) fails each of its pairs with
/// [`ReasonCode::ValuationError`]. None of these abort the check.
///
/// # Errors
///
/// Returns `UnknownTenor` or `InvalidCurve` when a scenario cannot be applied
/// to the baseline curve, since no instrument can then be compared.
pub fn run_unit_tests(
    sample: &[SampledInstrument],
    curve: &DiscountCurve,
    scenarios: &[ShockScenario],
    model_delta_pv: &[ModelDeltaPv],
    config: &ValidationConfig,
    step_number: u32,
) -> EngineResult<UnitTestResult> {
    let shocked_curves = scenarios
        .iter()
        .map(|s| Ok((s.name.as_str(), apply_shock(curve, s)?)))
        .collect::<EngineResult<Vec<_>>>()?;

    let mut records = Vec::new();

    for instrument in sample {
        let tolerance = unit_test_tolerance(instrument.notional, config);
        let fail = |scenario_name: &str, manual, model, reason| UnitTestRecord {
            instrument_id: instrument.instrument_id.clone(),
            scenario_name: scenario_name.to_string(),
            manual_delta_pv: manual,
            model_delta_pv: model,
            absolute_diff: None,
            tolerance,
            status: CheckStatus::Fail,
            reason: Some(reason),
        };

        let base_pv = match present_value(&instrument.cash_flows, curve) {
            Ok(pv) => Some(pv),
            Err(err) => {
                warn!(
                    instrument_id = %instrument.instrument_id,
                    error = %err,
                    "Instrument cannot be valued on the baseline curve"
                );
                None
            }
        };

        for scenario_name in &instrument.scenarios {
            let model = model_delta_pv
                .iter()
                .find(|m| {
                    m.instrument_id == instrument.instrument_id && m.scenario_name == *scenario_name
                })
                .map(|m| m.delta_pv);

            let Some((_, shocked)) = shocked_curves
                .iter()
                .find(|(name, _)| *name == scenario_name.as_str())
            else {
                warn!(
                    instrument_id = %instrument.instrument_id,
                    scenario = %scenario_name,
                    "Sampled scenario was not supplied"
                );
                records.push(fail(scenario_name, None, model, ReasonCode::UnknownScenario));
                continue;
            };

            let Some(base_pv) = base_pv else {
                records.push(fail(scenario_name, None, model, ReasonCode::ValuationError));
                continue;
            };

            let delta = present_value(&instrument.cash_flows, shocked).and_then(|shocked_pv| {
                shocked_pv
                    .checked_sub(base_pv)
                    .ok_or_else(|| EngineError::CalculationError {
                        message: "Overflow computing ΔPV".to_string(),
                    })
            });
            let manual = match delta {
                Ok(manual) => manual,
                Err(err) => {
                    warn!(
                        instrument_id = %instrument.instrument_id,
                        scenario = %scenario_name,
                        error = %err,
                        "Instrument cannot be valued on the shocked curve"
                    );
                    records.push(fail(scenario_name, None, model, ReasonCode::ValuationError));
                    continue;
                }
            };

            let Some(model) = model else {
                records.push(fail(
                    scenario_name,
                    Some(manual),
                    None,
                    ReasonCode::MissingModelOutput,
                ));
                continue;
            };

            let record = match absolute_difference(manual, model) {
                Some(diff) => UnitTestRecord {
                    instrument_id: instrument.instrument_id.clone(),
                    scenario_name: scenario_name.clone(),
                    manual_delta_pv: Some(manual),
                    model_delta_pv: Some(model),
                    absolute_diff: Some(diff),
                    tolerance,
                    status: if within_tolerance(diff, tolerance) {
                        CheckStatus::Pass
                    } else {
                        CheckStatus::Fail
                    },
                    reason: None,
                },
                None => fail(scenario_name, Some(manual), Some(model), ReasonCode::OutOfRange),
            };
            records.push(record);
        }
    }

    let passed = records
        .iter()
        .filter(|r| r.status == CheckStatus::Pass)
        .count();
    let count_reason = |reason: ReasonCode| {
        records
            .iter()
            .filter(|r| r.reason == Some(reason))
            .count()
    };
    let missing_model_output = count_reason(ReasonCode::MissingModelOutput);
    let valuation_errors = count_reason(ReasonCode::ValuationError);
    let failed = records.len() - passed;

    debug!(
        instruments = sample.len(),
        pairs = records.len(),
        passed,
        failed,
        "Instrument unit tests complete"
    );

    let audit_step = AuditStep {
        step_number,
        rule_id: "instrument_unit_test".to_string(),
        rule_name: "Instrument ΔPV Unit Test".to_string(),
        input: serde_json::json!({
            "instruments": sample.len(),
            "scenarios": scenarios.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            "curve_currency": curve.currency(),
            "tolerance_abs": config.unit_test_tolerance_abs.normalize().to_string(),
            "tolerance_pct_notional": config.unit_test_tolerance_pct_notional.normalize().to_string()
        }),
        output: serde_json::json!({
            "pairs": records.len(),
            "passed": passed,
            "failed": failed,
            "missing_model_output": missing_model_output,
            "valuation_errors": valuation_errors
        }),
        reasoning: format!(
            "{} of {} (instrument, scenario) pairs reproduce the model ΔPV within tolerance",
            passed,
            records.len()
        ),
    };

    Ok(UnitTestResult {
        records,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_BACKTEST_MIN_SAMPLE, SlopePolicy};
    use crate::models::{CashFlow, CashFlowSeries, CurveGapPolicy, LimitBasis};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_config() -> ValidationConfig {
        ValidationConfig {
            pv_tolerance_pct: dec("2"),
            unit_test_tolerance_abs: dec("0.02"),
            unit_test_tolerance_pct_notional: Decimal::ZERO,
            backtest_r2_min: dec("0.7"),
            backtest_slope_band: dec("0.1"),
            backtest_min_sample: DEFAULT_BACKTEST_MIN_SAMPLE,
            backtest_slope_policy: SlopePolicy::Warn,
            limit_warning_threshold: dec("10"),
            limit_breach_threshold: dec("15"),
            limit_basis: LimitBasis::PctTier1Capital,
            limits: vec![],
        }
    }

    fn flat_curve() -> DiscountCurve {
        DiscountCurve::flat("EUR", &[1, 2, 3], dec("0.05"), CurveGapPolicy::Strict).unwrap()
    }

    fn instrument(id: &str, scenarios: &[&str]) -> SampledInstrument {
        SampledInstrument {
            instrument_id: id.to_string(),
            notional: dec("100"),
            cash_flows: CashFlowSeries::new(vec![CashFlow {
                instrument_id: id.to_string(),
                period: 1,
                amount: dec("100"),
                currency: "EUR".to_string(),
            }]),
            scenarios: scenarios.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn model(id: &str, scenario: &str, delta: &str) -> ModelDeltaPv {
        ModelDeltaPv {
            instrument_id: id.to_string(),
            scenario_name: scenario.to_string(),
            delta_pv: dec(delta),
        }
    }

    fn down_100bp(curve: &DiscountCurve) -> ShockScenario {
        ShockScenario::parallel("parallel_down", curve, dec("-0.01"))
    }

    #[test]
    fn test_manual_delta_matches_closed_form() {
        let curve = flat_curve();
        let result = run_unit_tests(
            &[instrument("loan_001", &["parallel_down"])],
            &curve,
            &[down_100bp(&curve)],
            &[model("loan_001", "parallel_down", "0.90")],
            &create_test_config(),
            1,
        )
        .unwrap();

        let record = &result.records[0];
        let expected = dec("100") / dec("1.04") - dec("100") / dec("1.05");
        assert_eq!(record.manual_delta_pv, Some(expected));
        assert!(expected > dec("0.9157") && expected < dec("0.9158"));
    }

    #[test]
    fn test_model_figure_within_tolerance_passes() {
        let curve = flat_curve();
        let result = run_unit_tests(
            &[instrument("loan_001", &["parallel_down"])],
            &curve,
            &[down_100bp(&curve)],
            &[model("loan_001", "parallel_down", "0.90")],
            &create_test_config(),
            1,
        )
        .unwrap();

        assert_eq!(result.records[0].status, CheckStatus::Pass);
        assert_eq!(result.records[0].tolerance, dec("0.02"));
        assert!(result.records[0].absolute_diff.unwrap() < dec("0.02"));
    }

    #[test]
    fn test_model_figure_outside_tolerance_fails() {
        let curve = flat_curve();
        let result = run_unit_tests(
            &[instrument("loan_001", &["parallel_down"])],
            &curve,
            &[down_100bp(&curve)],
            &[model("loan_001", "parallel_down", "0.5")],
            &create_test_config(),
            1,
        )
        .unwrap();

        assert_eq!(result.records[0].status, CheckStatus::Fail);
        assert!(result.records[0].reason.is_none());
    }

    #[test]
    fn test_missing_model_output_fails_loudly() {
        let curve = flat_curve();
        let result = run_unit_tests(
            &[instrument("loan_001", &["parallel_down"])],
            &curve,
            &[down_100bp(&curve)],
            &[],
            &create_test_config(),
            1,
        )
        .unwrap();

        let record = &result.records[0];
        assert_eq!(record.status, CheckStatus::Fail);
        assert_eq!(record.reason, Some(ReasonCode::MissingModelOutput));
        assert!(record.manual_delta_pv.is_some());
        assert!(record.model_delta_pv.is_none());
        assert_eq!(result.audit_step.output["missing_model_output"], 1);
    }

    #[test]
    fn test_unsupplied_scenario_fails_record() {
        let curve = flat_curve();
        let result = run_unit_tests(
            &[instrument("loan_001", &["steepener"])],
            &curve,
            &[down_100bp(&curve)],
            &[model("loan_001", "steepener", "1.0")],
            &create_test_config(),
            1,
        )
        .unwrap();

        assert_eq!(result.records[0].status, CheckStatus::Fail);
        assert_eq!(result.records[0].reason, Some(ReasonCode::UnknownScenario));
        assert!(result.records[0].manual_delta_pv.is_none());
    }

    #[test]
    fn test_records_follow_sample_and_scenario_order() {
        let curve = flat_curve();
        let up = ShockScenario::parallel("parallel_up", &curve, dec("0.02"));
        let sample = [
            instrument("b", &["parallel_up", "parallel_down"]),
            instrument("a", &["parallel_down"]),
        ];

        let result = run_unit_tests(
            &sample,
            &curve,
            &[down_100bp(&curve), up],
            &[],
            &create_test_config(),
            1,
        )
        .unwrap();

        let pairs: Vec<(&str, &str)> = result
            .records
            .iter()
            .map(|r| (r.instrument_id.as_str(), r.scenario_name.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("b", "parallel_up"),
                ("b", "parallel_down"),
                ("a", "parallel_down")
            ]
        );
    }

    #[test]
    fn test_tolerance_scales_with_notional() {
        let mut config = create_test_config();
        config.unit_test_tolerance_pct_notional = dec("0.01");

        assert_eq!(unit_test_tolerance(dec("1000000"), &config), dec("100"));
        assert_eq!(unit_test_tolerance(dec("-1000000"), &config), dec("100"));
        assert_eq!(unit_test_tolerance(dec("100"), &config), dec("0.02"));
    }

    #[test]
    fn test_scenario_off_curve_grid_aborts_check() {
        let curve = flat_curve();
        let bad = ShockScenario::new("parallel_down", vec![(30, dec("-0.01"))]);

        let result = run_unit_tests(
            &[instrument("loan_001", &["parallel_down"])],
            &curve,
            &[bad],
            &[],
            &create_test_config(),
            1,
        );

        assert!(matches!(result, Err(EngineError::UnknownTenor { tenor: 30, .. })));
    }

    #[test]
    fn test_curve_gap_fails_only_that_instruments_pairs() {
        let curve = flat_curve();
        let mut beyond_grid = instrument("loan_002", &["parallel_down", "parallel_up"]);
        beyond_grid.cash_flows = CashFlowSeries::new(vec![CashFlow {
            instrument_id: "loan_002".to_string(),
            period: 5,
            amount: dec("105"),
            currency: "EUR".to_string(),
        }]);
        let sample = [
            instrument("loan_001", &["parallel_down"]),
            beyond_grid,
            instrument("loan_003", &["parallel_down"]),
        ];

        let result = run_unit_tests(
            &sample,
            &curve,
            &[
                down_100bp(&curve),
                ShockScenario::parallel("parallel_up", &curve, dec("0.02")),
            ],
            &[
                model("loan_001", "parallel_down", "0.90"),
                model("loan_002", "parallel_down", "3.0"),
                model("loan_003", "parallel_down", "0.90"),
            ],
            &create_test_config(),
            1,
        )
        .unwrap();

        assert_eq!(result.records.len(), 4);
        assert_eq!(result.records[0].status, CheckStatus::Pass);
        assert_eq!(result.records[3].status, CheckStatus::Pass);
        for record in &result.records[1..3] {
            assert_eq!(record.instrument_id, "loan_002");
            assert_eq!(record.status, CheckStatus::Fail);
            assert_eq!(record.reason, Some(ReasonCode::ValuationError));
            assert!(record.manual_delta_pv.is_none());
        }
        assert_eq!(result.records[1].model_delta_pv, Some(dec("3.0")));
        assert_eq!(result.audit_step.output["valuation_errors"], 2);
    }

    #[test]
    fn test_currency_mismatch_fails_instrument_pairs() {
        let curve = flat_curve();
        let mut usd = instrument("loan_usd", &["parallel_down"]);
        usd.cash_flows = CashFlowSeries::new(vec![CashFlow {
            instrument_id: "loan_usd".to_string(),
            period: 1,
            amount: dec("100"),
            currency: "USD".to_string(),
        }]);

        let result = run_unit_tests(
            &[usd],
            &curve,
            &[down_100bp(&curve)],
            &[model("loan_usd", "parallel_down", "0.90")],
            &create_test_config(),
            1,
        )
        .unwrap();

        assert_eq!(result.records[0].status, CheckStatus::Fail);
        assert_eq!(result.records[0].reason, Some(ReasonCode::ValuationError));
    }

    #[test]
    fn test_model_figure_beyond_decimal_range_fails_record() {
        let curve = flat_curve();
        let mut large = instrument("loan_001", &["parallel_down"]);
        large.cash_flows = CashFlowSeries::new(vec![CashFlow {
            instrument_id: "loan_001".to_string(),
            period: 1,
            amount: dec("10000"),
            currency: "EUR".to_string(),
        }]);

        let result = run_unit_tests(
            &[large],
            &curve,
            &[down_100bp(&curve)],
            &[ModelDeltaPv {
                instrument_id: "loan_001".to_string(),
                scenario_name: "parallel_down".to_string(),
                delta_pv: Decimal::MIN,
            }],
            &create_test_config(),
            1,
        )
        .unwrap();

        assert_eq!(result.records[0].status, CheckStatus::Fail);
        assert_eq!(result.records[0].reason, Some(ReasonCode::OutOfRange));
        assert!(result.records[0].manual_delta_pv.is_some());
    }

    #[test]
    fn test_identical_inputs_give_identical_records() {
        let curve = flat_curve();
        let sample = [instrument("loan_001", &["parallel_down"])];
        let scenarios = [down_100bp(&curve)];
        let figures = [model("loan_001", "parallel_down", "0.91")];
        let config = create_test_config();

        let first = run_unit_tests(&sample, &curve, &scenarios, &figures, &config, 1).unwrap();
        let second = run_unit_tests(&sample, &curve, &scenarios, &figures, &config, 1).unwrap();

        assert_eq!(first.records, second.records);
    }
}
