//! Backtesting of modeled against realized NII/EVE changes.
//!
//! This module regresses realized changes on modeled changes by ordinary
//! least squares and grades the fit against the configured accuracy
//! threshold and slope band.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{SlopePolicy, ValidationConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, BacktestResult, BacktestSeries, CheckStatus};

/// The result of a backtest, including the regression and audit step.
#[derive(Debug, Clone)]
pub struct BacktestRun {
    /// The regression statistics and grade.
    pub result: BacktestResult,
    /// The audit step recording this check.
    pub audit_step: AuditStep,
}

/// Ordinary least-squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regression {
    /// The fitted slope.
    pub slope: Decimal,
    /// The fitted intercept.
    pub intercept: Decimal,
    /// The coefficient of determination, in [0, 1].
    pub r_squared: Decimal,
}

/// Fits `y` on `x` by ordinary least squares.
///
/// Returns `Ok(None)` when `x` has zero variance or fewer than two points.
/// When `y` has zero variance the fit is exact and R² is 1.
///
/// # Errors
///
/// Returns `CalculationError` if an intermediate sum or product leaves the
/// `Decimal` range.
///
/// # Examples
///
/// ```
/// use irrbb_validation::checks::ols_regression;
/// use rust_decimal::Decimal;
///
/// let pairs: Vec<(Decimal, Decimal)> = (1..=4)
///     .map(|i| (Decimal::from(i), Decimal::from(2 * i + 1)))
///     .collect();
/// let fit = ols_regression(&pairs)?.expect("modeled values vary");
/// assert_eq!(fit.slope, Decimal::from(2));
/// assert_eq!(fit.intercept, Decimal::ONE);
/// assert_eq!(fit.r_squared, Decimal::ONE);
/// # Ok::<(), irrbb_validation::error::EngineError>(())
/// ```
pub fn ols_regression(pairs: &[(Decimal, Decimal)]) -> EngineResult<Option<Regression>> {
    if pairs.len() < 2 {
        return Ok(None);
    }

    let count = Decimal::from(pairs.len());
    let mean_x = checked_sum(pairs.iter().map(|(x, _)| *x)).ok_or_else(|| overflow("mean"))? / count;
    let mean_y = checked_sum(pairs.iter().map(|(_, y)| *y)).ok_or_else(|| overflow("mean"))? / count;

    let (sxx, sxy, syy) = pairs
        .iter()
        .try_fold(
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            |(sxx, sxy, syy), (x, y)| {
                let dx = x.checked_sub(mean_x)?;
                let dy = y.checked_sub(mean_y)?;
                Some((
                    sxx.checked_add(dx.checked_mul(dx)?)?,
                    sxy.checked_add(dx.checked_mul(dy)?)?,
                    syy.checked_add(dy.checked_mul(dy)?)?,
                ))
            },
        )
        .ok_or_else(|| overflow("sums of squares"))?;

    if sxx.is_zero() {
        return Ok(None);
    }

    let slope = sxy.checked_div(sxx).ok_or_else(|| overflow("slope"))?;
    let intercept = slope
        .checked_mul(mean_x)
        .and_then(|fitted| mean_y.checked_sub(fitted))
        .ok_or_else(|| overflow("intercept"))?;
    // sxy² / (sxx * syy) rearranged to keep intermediates small.
    let r_squared = if syy.is_zero() {
        Decimal::ONE
    } else {
        sxy.checked_div(syy)
            .and_then(|ratio| slope.checked_mul(ratio))
            .ok_or_else(|| overflow("R²"))?
            .clamp(Decimal::ZERO, Decimal::ONE)
    };

    Ok(Some(Regression {
        slope,
        intercept,
        r_squared,
    }))
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
}

fn overflow(quantity: &str) -> EngineError {
    EngineError::CalculationError {
        message: format!("Overflow computing backtest {}", quantity),
    }
}

/// Grades a regression against the configured thresholds.
///
/// R² below `backtest_r2_min` fails. Otherwise a slope within
/// `backtest_slope_band` of 1.0 passes, and an off-band slope is graded by
/// `backtest_slope_policy`.
pub fn grade_backtest(regression: &Regression, config: &ValidationConfig) -> CheckStatus {
    if regression.r_squared < config.backtest_r2_min {
        return CheckStatus::Fail;
    }

    let slope_in_band = regression
        .slope
        .checked_sub(Decimal::ONE)
        .is_some_and(|deviation| deviation.abs() <= config.backtest_slope_band);
    if slope_in_band {
        return CheckStatus::Pass;
    }

    match config.backtest_slope_policy {
        SlopePolicy::Warn => CheckStatus::Warning,
        SlopePolicy::Fail => CheckStatus::Fail,
        SlopePolicy::Ignore => CheckStatus::Pass,
    }
}

/// Backtests one metric's history.
///
/// Periods with a missing modeled or realized value are excluded and listed
/// in `excluded_periods`; `sample_size` is the number of periods actually used.
///
/// # Errors
///
/// - `InsufficientData` if fewer than `backtest_min_sample` periods are usable
/// - `DegenerateRegression` if the modeled values do not vary
/// - `CalculationError` if the values are too large to regress in `Decimal`
pub fn run_backtest(
    series: &BacktestSeries,
    config: &ValidationConfig,
    step_number: u32,
) -> EngineResult<BacktestRun> {
    let metric = series.metric;
    let mut pairs = Vec::with_capacity(series.points.len());
    let mut excluded_periods = Vec::new();

    for point in &series.points {
        match point.pair() {
            Some(pair) => pairs.push(pair),
            None => excluded_periods.push(point.period),
        }
    }

    if pairs.len() < config.backtest_min_sample {
        return Err(EngineError::InsufficientData {
            metric: metric.to_string(),
            required: config.backtest_min_sample,
            available: pairs.len(),
        });
    }

    let regression = ols_regression(&pairs)?.ok_or_else(|| EngineError::DegenerateRegression {
        metric: metric.to_string(),
    })?;

    let count = Decimal::from(pairs.len());
    let mean_absolute_error = pairs
        .iter()
        .try_fold(Decimal::ZERO, |acc, (modeled, realized)| {
            acc.checked_add(realized.checked_sub(*modeled)?.abs())
        })
        .ok_or_else(|| overflow("mean absolute error"))?
        / count;

    let status = grade_backtest(&regression, config);

    debug!(
        metric = %metric,
        sample_size = pairs.len(),
        excluded = excluded_periods.len(),
        slope = %regression.slope,
        r_squared = %regression.r_squared,
        "Backtest regression complete"
    );

    let audit_step = AuditStep {
        step_number,
        rule_id: format!("backtest_{}", metric.to_string().to_lowercase()),
        rule_name: format!("{} Backtest", metric),
        input: serde_json::json!({
            "periods": series.points.len(),
            "excluded_periods": excluded_periods.len(),
            "r2_min": config.backtest_r2_min.normalize().to_string(),
            "slope_band": config.backtest_slope_band.normalize().to_string()
        }),
        output: serde_json::json!({
            "slope": regression.slope.round_dp(6).normalize().to_string(),
            "intercept": regression.intercept.round_dp(6).normalize().to_string(),
            "r_squared": regression.r_squared.round_dp(6).normalize().to_string(),
            "status": status
        }),
        reasoning: format!(
            "Realized {} regressed on modeled over {} periods: R² {} against minimum {}, slope {} against 1 ± {}",
            metric,
            pairs.len(),
            regression.r_squared.round_dp(4).normalize(),
            config.backtest_r2_min.normalize(),
            regression.slope.round_dp(4).normalize(),
            config.backtest_slope_band.normalize()
        ),
    };

    Ok(BacktestRun {
        result: BacktestResult {
            metric,
            slope: regression.slope,
            intercept: regression.intercept,
            r_squared: regression.r_squared,
            sample_size: pairs.len(),
            excluded_periods,
            mean_absolute_error,
            status,
        },
        audit_step,
    })
}
