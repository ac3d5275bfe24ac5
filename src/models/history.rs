//! Historical series consumed by the backtest engine and the limit evaluator.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The risk metric a backtest series measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BacktestMetric {
    /// Change in net interest income.
    #[serde(rename = "NII")]
    Nii,
    /// Change in economic value of equity.
    #[serde(rename = "EVE")]
    Eve,
}

impl fmt::Display for BacktestMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacktestMetric::Nii => write!(f, "NII"),
            BacktestMetric::Eve => write!(f, "EVE"),
        }
    }
}

/// One historical period of modeled versus realized change.
///
/// A missing value (`None`) marks data that is unavailable for the period;
/// such points are excluded from the regression, never replaced by zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestPoint {
    /// The period-end date.
    pub period: NaiveDate,
    /// The change the model predicted for the period.
    pub modeled_delta: Option<Decimal>,
    /// The change actually realized in the period.
    pub realized_delta: Option<Decimal>,
}

impl BacktestPoint {
    /// Creates a point with both values present.
    pub fn new(period: NaiveDate, modeled_delta: Decimal, realized_delta: Decimal) -> Self {
        Self {
            period,
            modeled_delta: Some(modeled_delta),
            realized_delta: Some(realized_delta),
        }
    }

    /// Returns the (modeled, realized) pair when both are available.
    pub fn pair(&self) -> Option<(Decimal, Decimal)> {
        Some((self.modeled_delta?, self.realized_delta?))
    }
}

/// The ordered history backtested for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestSeries {
    /// The metric measured by the series.
    pub metric: BacktestMetric,
    /// Points in chronological order.
    pub points: Vec<BacktestPoint>,
}

/// The unit in which a limit and its observations are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitBasis {
    /// Percent of Tier 1 capital (15 = 15%).
    #[default]
    PctTier1Capital,
    /// Absolute currency amount.
    Absolute,
}

/// A single observation of a limit-monitored risk metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricObservation {
    /// The period-end date.
    pub period: NaiveDate,
    /// The metric value, expressed in the basis of the metric's limit.
    pub value: Decimal,
}

/// The ordered observations of one limit-monitored metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSeries {
    /// The metric name (e.g., "delta_eve_tier1").
    pub metric_name: String,
    /// Observations in chronological order.
    pub observations: Vec<MetricObservation>,
}
