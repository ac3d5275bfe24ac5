//! Risk limit evaluation.
//!
//! Each observation of a monitored metric is classified against the warning
//! and breach thresholds of its limit, and the breach history of each metric
//! is summarised across the whole observation sequence.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::{LimitConfig, ValidationConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, LimitBasis, LimitClassification, LimitEvaluation, LimitTrend, MetricSeries,
    TrendDirection,
};

/// The result of evaluating every monitored metric.
#[derive(Debug, Clone)]
pub struct LimitEvaluationResult {
    /// One evaluation per observation, in series then period order.
    pub evaluations: Vec<LimitEvaluation>,
    /// One trend per series, in series order.
    pub trends: Vec<LimitTrend>,
    /// The audit step recording this check.
    pub audit_step: AuditStep,
}

/// Classifies a value against a limit.
///
/// Thresholds bound the magnitude of exposure in either direction, so the
/// comparison is on `|value|`, breach first. Both boundaries are inclusive.
///
/// # Examples
///
/// ```
/// use irrbb_validation::checks::classify;
/// use irrbb_validation::config::LimitConfig;
/// use irrbb_validation::models::{LimitBasis, LimitClassification};
/// use rust_decimal::Decimal;
///
/// let limit = LimitConfig {
///     metric_name: "delta_eve_tier1".to_string(),
///     warning_threshold: Decimal::from(10),
///     breach_threshold: Decimal::from(15),
///     basis: LimitBasis::PctTier1Capital,
/// };
/// assert_eq!(classify(Decimal::from(-15), &limit), LimitClassification::Breach);
/// ```
pub fn classify(value: Decimal, limit: &LimitConfig) -> LimitClassification {
    let magnitude = value.abs();
    if magnitude >= limit.breach_threshold {
        LimitClassification::Breach
    } else if magnitude >= limit.warning_threshold {
        LimitClassification::Warning
    } else {
        LimitClassification::Ok
    }
}

/// Classifies every observation of a series, preserving period order.
pub fn evaluate_limits(series: &MetricSeries, limit: &LimitConfig) -> Vec<LimitEvaluation> {
    series
        .observations
        .iter()
        .map(|observation| {
            let classification = classify(observation.value, limit);
            let threshold_used = match classification {
                LimitClassification::Breach => limit.breach_threshold,
                _ => limit.warning_threshold,
            };

            LimitEvaluation {
                metric_name: series.metric_name.clone(),
                period: observation.period,
                value: observation.value,
                classification,
                threshold_used,
                basis: limit.basis,
            }
        })
        .collect()
}

/// Summarises the breach history of one metric.
///
/// `evaluations` must be in period order; the direction compares `|value|`
/// of the last two observations.
pub fn track_trend(metric_name: &str, evaluations: &[LimitEvaluation]) -> LimitTrend {
    let count = |wanted: LimitClassification| {
        evaluations
            .iter()
            .filter(|e| e.classification == wanted)
            .count()
    };

    let most_recent_breach = evaluations
        .iter()
        .rev()
        .find(|e| e.classification == LimitClassification::Breach)
        .map(|e| e.period);

    let direction = match evaluations {
        [.., previous, latest] => {
            let (before, after) = (previous.value.abs(), latest.value.abs());
            Some(if after > before {
                TrendDirection::Rising
            } else if after < before {
                TrendDirection::Falling
            } else {
                TrendDirection::Flat
            })
        }
        _ => None,
    };

    LimitTrend {
        metric_name: metric_name.to_string(),
        observations: evaluations.len(),
        warning_count: count(LimitClassification::Warning),
        breach_count: count(LimitClassification::Breach),
        most_recent_breach,
        latest_classification: evaluations.last().map(|e| e.classification),
        direction,
    }
}

/// Expresses a raw exposure in a limit basis.
///
/// For [`LimitBasis::PctTier1Capital`] the exposure becomes a percentage of
/// Tier 1 capital (15 = 15%); [`LimitBasis::Absolute`] returns it unchanged.
///
/// # Errors
///
/// Returns `CalculationError` if the basis is a percentage and
/// `tier1_capital` is not positive.
pub fn to_limit_basis(
    exposure: Decimal,
    tier1_capital: Decimal,
    basis: LimitBasis,
) -> EngineResult<Decimal> {
    match basis {
        LimitBasis::Absolute => Ok(exposure),
        LimitBasis::PctTier1Capital => {
            if tier1_capital <= Decimal::ZERO {
                return Err(EngineError::CalculationError {
                    message: format!("Tier 1 capital must be positive (got {})", tier1_capital),
                });
            }
            exposure
                .checked_mul(Decimal::ONE_HUNDRED)
                .and_then(|scaled| scaled.checked_div(tier1_capital))
                .ok_or_else(|| EngineError::CalculationError {
                    message: format!(
                        "Overflow expressing {} as a share of Tier 1 capital {}",
                        exposure, tier1_capital
                    ),
                })
        }
    }
}

/// Evaluates every metric series against its configured limit.
///
/// Series without a dedicated limit use the default thresholds of `config`.
pub fn evaluate_risk_limits(
    metric_series: &[MetricSeries],
    config: &ValidationConfig,
    step_number: u32,
) -> LimitEvaluationResult {
    let mut evaluations = Vec::new();
    let mut trends = Vec::with_capacity(metric_series.len());

    for series in metric_series {
        let limit = config.limit_for(&series.metric_name);
        let series_evaluations = evaluate_limits(series, &limit);
        let trend = track_trend(&series.metric_name, &series_evaluations);

        if trend.latest_classification == Some(LimitClassification::Breach) {
            warn!(
                metric = %series.metric_name,
                breach_count = trend.breach_count,
                threshold = %limit.breach_threshold,
                "Latest observation breaches limit"
            );
        }

        evaluations.extend(series_evaluations);
        trends.push(trend);
    }

    let warnings: usize = trends.iter().map(|t| t.warning_count).sum();
    let breaches: usize = trends.iter().map(|t| t.breach_count).sum();

    debug!(
        metrics = trends.len(),
        observations = evaluations.len(),
        warnings,
        breaches,
        "Risk limit evaluation complete"
    );

    let audit_step = AuditStep {
        step_number,
        rule_id: "risk_limits".to_string(),
        rule_name: "Risk Limit Evaluation".to_string(),
        input: serde_json::json!({
            "metrics": metric_series
                .iter()
                .map(|s| s.metric_name.as_str())
                .collect::<Vec<_>>(),
            "observations": evaluations.len()
        }),
        output: serde_json::json!({
            "warnings": warnings,
            "breaches": breaches
        }),
        reasoning: format!(
            "{} observations across {} metrics classified by magnitude: {} warnings, {} breaches",
            evaluations.len(),
            trends.len(),
            warnings,
            breaches
        ),
    };

    LimitEvaluationResult {
        evaluations,
        trends,
        audit_step,
    }
}
