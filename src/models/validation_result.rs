//! Validation result models.
//!
//! This module contains the immutable records produced by each checker and
//! the [`ValidationRunResult`] that aggregates them. The run result is the
//! only artifact handed to external collaborators (results tables, charts,
//! governance documents, monitoring dashboards).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BacktestMetric, LimitBasis};
use crate::error::{EngineError, EngineResult};

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// The check passed.
    Pass,
    /// The check passed its primary criterion but raised a concern.
    Warning,
    /// The check failed.
    Fail,
}

/// Why a record failed without a numeric comparison taking place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// The balance-sheet line exists in only one of the two sources.
    MissingLine,
    /// The model reported no figure for a sampled (instrument, scenario) pair.
    MissingModelOutput,
    /// A sampled scenario name is not among the supplied scenarios.
    UnknownScenario,
    /// The instrument's cash flows could not be valued on the curve.
    ValuationError,
    /// The difference between the two figures exceeds the `Decimal` range.
    OutOfRange,
}

/// Reconciliation of the model's baseline PV against book value for one line.
///
/// # Example
///
/// ```
/// use irrbb_validation::models::{CheckStatus, ReconciliationRecord};
/// use rust_decimal::Decimal;
///
/// let record = ReconciliationRecord {
///     balance_sheet_line: "Loans".to_string(),
///     model_pv: Some(Decimal::new(100, 0)),
///     book_value: Some(Decimal::new(102, 0)),
///     absolute_diff: Some(Decimal::new(2, 0)),
///     relative_diff: Some(Decimal::new(196, 4)),
///     tolerance: Decimal::new(2, 2),
///     status: CheckStatus::Pass,
///     reason: None,
/// };
/// assert_eq!(record.status, CheckStatus::Pass);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    /// The balance-sheet line.
    pub balance_sheet_line: String,
    /// The model's baseline PV, if the model reports the line.
    pub model_pv: Option<Decimal>,
    /// The book value, if the ledger reports the line.
    pub book_value: Option<Decimal>,
    /// `|model_pv - book_value|`, when both are present.
    pub absolute_diff: Option<Decimal>,
    /// Absolute difference relative to the book value, when both are present.
    pub relative_diff: Option<Decimal>,
    /// The relative tolerance applied (0.02 = 2%).
    pub tolerance: Decimal,
    /// Pass or fail.
    pub status: CheckStatus,
    /// Set when the record failed for a data-shape reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
}

/// Independent recomputation of a model ΔPV for one instrument and scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTestRecord {
    /// The instrument under test.
    pub instrument_id: String,
    /// The shock scenario applied.
    pub scenario_name: String,
    /// ΔPV recomputed from the instrument's cash flows.
    pub manual_delta_pv: Option<Decimal>,
    /// ΔPV reported by the model.
    pub model_delta_pv: Option<Decimal>,
    /// `|manual - model|`, when both are present.
    pub absolute_diff: Option<Decimal>,
    /// The absolute tolerance applied.
    pub tolerance: Decimal,
    /// Pass or fail.
    pub status: CheckStatus,
    /// Set when the record failed for a data-shape reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
}

/// Regression of realized on modeled changes for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// The metric backtested.
    pub metric: BacktestMetric,
    /// OLS slope of realized on modeled.
    pub slope: Decimal,
    /// OLS intercept.
    pub intercept: Decimal,
    /// Coefficient of determination.
    pub r_squared: Decimal,
    /// The number of periods used in the regression.
    pub sample_size: usize,
    /// Periods dropped because a modeled or realized value was missing.
    pub excluded_periods: Vec<NaiveDate>,
    /// Mean of `|realized - modeled|` over the periods used.
    pub mean_absolute_error: Decimal,
    /// Pass, warning or fail.
    pub status: CheckStatus,
}

/// Classification of a metric observation against its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitClassification {
    /// Below the warning threshold.
    Ok,
    /// At or above the warning threshold, below the breach threshold.
    Warning,
    /// At or above the breach threshold.
    Breach,
}

/// One metric observation classified against its limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitEvaluation {
    /// The metric name.
    pub metric_name: String,
    /// The period-end date of the observation.
    pub period: NaiveDate,
    /// The observed value.
    pub value: Decimal,
    /// The classification of `|value|`.
    pub classification: LimitClassification,
    /// Breach threshold for breaches, warning threshold otherwise.
    pub threshold_used: Decimal,
    /// The basis the value and threshold are expressed in.
    pub basis: LimitBasis,
}

/// Direction of the exposure magnitude between the last two observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// `|value|` increased.
    Rising,
    /// `|value|` decreased.
    Falling,
    /// `|value|` unchanged.
    Flat,
}

/// Breach history of one metric across its observation sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitTrend {
    /// The metric name.
    pub metric_name: String,
    /// The number of observations evaluated.
    pub observations: usize,
    /// The number of warning observations.
    pub warning_count: usize,
    /// The number of breach observations.
    pub breach_count: usize,
    /// The period of the latest breach, if any.
    pub most_recent_breach: Option<NaiveDate>,
    /// The classification of the last observation.
    pub latest_classification: Option<LimitClassification>,
    /// Movement of `|value|` over the last two observations.
    pub direction: Option<TrendDirection>,
}

/// The checker whose contribution is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// PV reconciliation against book values.
    PvReconciliation,
    /// Instrument-level ΔPV unit tests.
    UnitTest,
    /// NII/EVE backtests.
    Backtest,
    /// Risk limit evaluation.
    RiskLimits,
}

/// A checker contribution that could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableCheck {
    /// The checker affected.
    pub check: CheckKind,
    /// The metric or series affected, when narrower than the whole checker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// The error that aborted the computation.
    pub reason: String,
}

impl UnavailableCheck {
    /// Records an aborted checker contribution.
    pub fn new(check: CheckKind, subject: Option<String>, error: &EngineError) -> Self {
        Self {
            check,
            subject,
            reason: error.to_string(),
        }
    }
}

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Downgrades the run to pass-with-warnings.
    Warning,
    /// Fails the run.
    Fail,
}

/// A reason contributing to the overall status of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// A stable code identifying the type of finding.
    pub code: String,
    /// The severity of the finding.
    pub severity: Severity,
    /// A human-readable description.
    pub message: String,
}

/// A single step in the audit trace recording a check.
///
/// Each step captures the input, output, and reasoning for a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the check that was applied.
    pub rule_id: String,
    /// The human-readable name of the check.
    pub rule_name: String,
    /// The input summary for this step.
    pub input: serde_json::Value,
    /// The output summary from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the outcome.
    pub reasoning: String,
}

/// The complete audit trace for a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of check steps.
    pub steps: Vec<AuditStep>,
}

/// The governance verdict of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every check passed.
    Pass,
    /// Nothing failed but at least one warning was raised.
    PassWithWarnings,
    /// At least one check failed or was unavailable.
    Fail,
}

/// The complete result of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRunResult {
    /// Fingerprint of the configuration and inputs the run was computed from.
    pub run_id: Uuid,
    /// When the run was performed.
    pub run_timestamp: DateTime<Utc>,
    /// The version of the engine that performed the run.
    pub engine_version: String,
    /// The governance verdict.
    pub overall_status: OverallStatus,
    /// The reasons behind the verdict.
    pub findings: Vec<Finding>,
    /// PV reconciliation records, in line order.
    pub reconciliation: Vec<ReconciliationRecord>,
    /// Instrument unit-test records, in sample order.
    pub unit_tests: Vec<UnitTestRecord>,
    /// Completed backtests, in series order.
    pub backtests: Vec<BacktestResult>,
    /// Limit evaluations, in series then period order.
    pub limit_evaluations: Vec<LimitEvaluation>,
    /// Breach history per metric, in series order.
    pub limit_trends: Vec<LimitTrend>,
    /// Checker contributions that could not be computed.
    pub unavailable: Vec<UnavailableCheck>,
    /// Audit trace of the checks performed.
    pub audit_trace: AuditTrace,
}

impl ValidationRunResult {
    /// Serializes the result to pretty-printed JSON.
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::SerializationError {
            message: e.to_string(),
        })
    }
}
