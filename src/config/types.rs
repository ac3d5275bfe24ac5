//! Configuration types for model validation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML. Unknown fields are rejected at load time and
//! value ranges are checked by [`ValidationConfig::validate`], so a bad
//! configuration never reaches a calculation.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::LimitBasis;

/// Default minimum number of usable periods for a backtest regression.
pub const DEFAULT_BACKTEST_MIN_SAMPLE: usize = 8;

/// Smallest minimum sample the configuration accepts.
pub const MIN_REGRESSION_SAMPLE: usize = 3;

fn default_backtest_min_sample() -> usize {
    DEFAULT_BACKTEST_MIN_SAMPLE
}

/// How a backtest whose R² passes but whose slope lies outside the band is graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlopePolicy {
    /// Off-band slope downgrades the result to a warning.
    #[default]
    Warn,
    /// Off-band slope fails the backtest.
    Fail,
    /// Only R² is graded.
    Ignore,
}

/// Warning and breach thresholds for one monitored metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitConfig {
    /// The metric the limit applies to.
    pub metric_name: String,
    /// `|value|` at or above this is a warning.
    pub warning_threshold: Decimal,
    /// `|value|` at or above this is a breach.
    pub breach_threshold: Decimal,
    /// The unit both thresholds are expressed in.
    #[serde(default)]
    pub basis: LimitBasis,
}

/// The complete validation configuration.
///
/// # Example
///
/// ```
/// use irrbb_validation::config::ConfigLoader;
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
/// assert_eq!(config.backtest_min_sample, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Relative PV reconciliation tolerance in percent (2.0 = 2%).
    pub pv_tolerance_pct: Decimal,
    /// Absolute ΔPV tolerance for instrument unit tests.
    pub unit_test_tolerance_abs: Decimal,
    /// ΔPV tolerance as a percent of instrument notional; the larger of the two applies.
    #[serde(default)]
    pub unit_test_tolerance_pct_notional: Decimal,
    /// Minimum R² for a backtest to pass.
    pub backtest_r2_min: Decimal,
    /// Maximum allowed `|slope - 1|` for a backtest to pass.
    pub backtest_slope_band: Decimal,
    /// Minimum number of usable periods for a backtest.
    #[serde(default = "default_backtest_min_sample")]
    pub backtest_min_sample: usize,
    /// Grading of an off-band slope.
    #[serde(default)]
    pub backtest_slope_policy: SlopePolicy,
    /// Warning threshold for metrics without their own limit.
    pub limit_warning_threshold: Decimal,
    /// Breach threshold for metrics without their own limit.
    pub limit_breach_threshold: Decimal,
    /// Basis of the default thresholds.
    #[serde(default)]
    pub limit_basis: LimitBasis,
    /// Per-metric limits overriding the defaults.
    #[serde(default)]
    pub limits: Vec<LimitConfig>,
}

impl ValidationConfig {
    /// Checks every field against its permitted range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> EngineResult<()> {
        non_negative("pv_tolerance_pct", self.pv_tolerance_pct)?;
        non_negative("unit_test_tolerance_abs", self.unit_test_tolerance_abs)?;
        non_negative(
            "unit_test_tolerance_pct_notional",
            self.unit_test_tolerance_pct_notional,
        )?;
        non_negative("backtest_slope_band", self.backtest_slope_band)?;

        if self.backtest_r2_min < Decimal::ZERO || self.backtest_r2_min > Decimal::ONE {
            return Err(invalid("backtest_r2_min", "must lie in [0, 1]"));
        }

        if self.backtest_min_sample < MIN_REGRESSION_SAMPLE {
            return Err(invalid(
                "backtest_min_sample",
                &format!("must be at least {}", MIN_REGRESSION_SAMPLE),
            ));
        }

        check_thresholds(
            "limit_warning_threshold",
            "limit_breach_threshold",
            self.limit_warning_threshold,
            self.limit_breach_threshold,
        )?;

        let mut seen = HashSet::new();
        for limit in &self.limits {
            if limit.metric_name.trim().is_empty() {
                return Err(invalid("limits.metric_name", "must not be empty"));
            }
            if !seen.insert(limit.metric_name.as_str()) {
                return Err(invalid(
                    "limits.metric_name",
                    &format!("duplicate limit for metric '{}'", limit.metric_name),
                ));
            }
            check_thresholds(
                &format!("limits[{}].warning_threshold", limit.metric_name),
                &format!("limits[{}].breach_threshold", limit.metric_name),
                limit.warning_threshold,
                limit.breach_threshold,
            )?;
        }

        Ok(())
    }

    /// Returns the reconciliation tolerance as a fraction (2% -> 0.02).
    pub fn pv_relative_tolerance(&self) -> Decimal {
        self.pv_tolerance_pct / Decimal::ONE_HUNDRED
    }

    /// Returns the limit for a metric, falling back to the default thresholds.
    pub fn limit_for(&self, metric_name: &str) -> LimitConfig {
        self.limits
            .iter()
            .find(|l| l.metric_name == metric_name)
            .cloned()
            .unwrap_or_else(|| LimitConfig {
                metric_name: metric_name.to_string(),
                warning_threshold: self.limit_warning_threshold,
                breach_threshold: self.limit_breach_threshold,
                basis: self.limit_basis,
            })
    }
}

fn invalid(field: &str, message: &str) -> EngineError {
    EngineError::InvalidConfig {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn non_negative(field: &str, value: Decimal) -> EngineResult<()> {
    if value < Decimal::ZERO {
        return Err(invalid(field, &format!("must not be negative (got {})", value)));
    }
    Ok(())
}

fn check_thresholds(
    warning_field: &str,
    breach_field: &str,
    warning: Decimal,
    breach: Decimal,
) -> EngineResult<()> {
    non_negative(warning_field, warning)?;
    if warning > breach {
        return Err(invalid(
            breach_field,
            &format!("must not be below the warning threshold ({} < {})", breach, warning),
        ));
    }
    Ok(())
}
