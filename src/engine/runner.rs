//! Orchestration of a full validation run.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::checks::{evaluate_risk_limits, reconcile_present_values, run_backtest, run_unit_tests};
use crate::config::ValidationConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AuditTrace, CheckKind, UnavailableCheck, ValidationRunResult};

use super::aggregator::{CheckOutcomes, aggregate};
use super::inputs::ValidationInputs;

/// Runs every checker over a set of inputs and aggregates the outcome.
///
/// # Example
///
/// ```
/// use irrbb_validation::config::ConfigLoader;
/// use irrbb_validation::engine::{ValidationEngine, ValidationInputs};
/// use irrbb_validation::models::{CurveGapPolicy, DiscountCurve, LineValue, OverallStatus};
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::from_yaml_str(
///     r#"
/// pv_tolerance_pct: 2.0
/// unit_test_tolerance_abs: 0.02
/// backtest_r2_min: 0.7
/// backtest_slope_band: 0.1
/// limit_warning_threshold: 10
/// limit_breach_threshold: 15
/// "#,
/// )
/// .unwrap();
///
/// let inputs = ValidationInputs {
///     model_pv: vec![LineValue::new("Loans", Decimal::from(100))],
///     book_values: vec![LineValue::new("Loans", Decimal::from(102))],
///     instrument_sample: vec![],
///     baseline_curve: DiscountCurve::flat("EUR", &[1], Decimal::new(5, 2), CurveGapPolicy::Strict)
///         .unwrap(),
///     scenarios: vec![],
///     model_delta_pv: vec![],
///     backtests: vec![],
///     metric_series: vec![],
/// };
///
/// let engine = ValidationEngine::new(config).unwrap();
/// let result = engine.run(&inputs).unwrap();
/// assert_eq!(result.overall_status, OverallStatus::Pass);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    config: ValidationConfig,
}

impl ValidationEngine {
    /// Creates an engine for a configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn new(config: ValidationConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration the engine runs with.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Runs the validation, stamped with the current time.
    pub fn run(&self, inputs: &ValidationInputs) -> EngineResult<ValidationRunResult> {
        self.run_at(inputs, Utc::now())
    }

    /// Runs the validation with a caller-supplied timestamp.
    ///
    /// Identical inputs and timestamp always give an identical result.
    ///
    /// # Errors
    ///
    /// Only fails if the inputs cannot be fingerprinted. Errors inside a
    /// checker are reported in the result as unavailable checks instead.
    pub fn run_at(
        &self,
        inputs: &ValidationInputs,
        run_timestamp: DateTime<Utc>,
    ) -> EngineResult<ValidationRunResult> {
        let run_id = self.fingerprint(inputs)?;
        info!(
            run_id = %run_id,
            lines = inputs.model_pv.len(),
            instruments = inputs.instrument_sample.len(),
            backtests = inputs.backtests.len(),
            metrics = inputs.metric_series.len(),
            "Starting validation run"
        );

        let mut steps: Vec<AuditStep> = Vec::new();
        let mut unavailable: Vec<UnavailableCheck> = Vec::new();
        let mut step_number: u32 = 1;

        // PV reconciliation
        let reconciliation = reconcile_present_values(
            &inputs.model_pv,
            &inputs.book_values,
            self.config.pv_relative_tolerance(),
            step_number,
        );
        steps.push(reconciliation.audit_step);
        step_number += 1;

        // Instrument unit tests
        let unit_tests = match run_unit_tests(
            &inputs.instrument_sample,
            &inputs.baseline_curve,
            &inputs.scenarios,
            &inputs.model_delta_pv,
            &self.config,
            step_number,
        ) {
            Ok(result) => {
                steps.push(result.audit_step);
                result.records
            }
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "Instrument unit tests unavailable");
                steps.push(unavailable_step(
                    step_number,
                    "instrument_unit_test",
                    "Instrument Unit Test",
                    &err,
                ));
                unavailable.push(UnavailableCheck::new(CheckKind::UnitTest, None, &err));
                Vec::new()
            }
        };
        step_number += 1;

        // Backtests, one contribution per metric
        let mut backtests = Vec::with_capacity(inputs.backtests.len());
        for series in &inputs.backtests {
            match run_backtest(series, &self.config, step_number) {
                Ok(run) => {
                    steps.push(run.audit_step);
                    backtests.push(run.result);
                }
                Err(err) => {
                    warn!(
                        run_id = %run_id,
                        metric = %series.metric,
                        error = %err,
                        "Backtest unavailable"
                    );
                    steps.push(unavailable_step(
                        step_number,
                        &format!("backtest_{}", series.metric.to_string().to_lowercase()),
                        &format!("{} Backtest", series.metric),
                        &err,
                    ));
                    unavailable.push(UnavailableCheck::new(
                        CheckKind::Backtest,
                        Some(series.metric.to_string()),
                        &err,
                    ));
                }
            }
            step_number += 1;
        }

        // Risk limits
        let limits = evaluate_risk_limits(&inputs.metric_series, &self.config, step_number);
        steps.push(limits.audit_step);
        step_number += 1;

        let verdict = aggregate(
            &CheckOutcomes {
                reconciliation: &reconciliation.records,
                unit_tests: &unit_tests,
                backtests: &backtests,
                limit_evaluations: &limits.evaluations,
                unavailable: &unavailable,
            },
            step_number,
        );
        steps.push(verdict.audit_step);

        info!(
            run_id = %run_id,
            overall_status = ?verdict.overall_status,
            findings = verdict.findings.len(),
            unavailable = unavailable.len(),
            "Validation run completed"
        );

        Ok(ValidationRunResult {
            run_id,
            run_timestamp,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            overall_status: verdict.overall_status,
            findings: verdict.findings,
            reconciliation: reconciliation.records,
            unit_tests,
            backtests,
            limit_evaluations: limits.evaluations,
            limit_trends: limits.trends,
            unavailable,
            audit_trace: AuditTrace { steps },
        })
    }

    /// Derives a name-based UUID from the configuration and inputs.
    fn fingerprint(&self, inputs: &ValidationInputs) -> EngineResult<Uuid> {
        let payload = serde_json::to_vec(&(&self.config, inputs)).map_err(|e| {
            EngineError::SerializationError {
                message: e.to_string(),
            }
        })?;
        Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, &payload))
    }
}

fn unavailable_step(
    step_number: u32,
    rule_id: &str,
    rule_name: &str,
    error: &EngineError,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: rule_id.to_string(),
        rule_name: rule_name.to_string(),
        input: serde_json::Value::Null,
        output: serde_json::json!({ "status": "unavailable" }),
        reasoning: error.to_string(),
    }
}
