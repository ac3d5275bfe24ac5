//! The in-memory inputs of a validation run.

use serde::{Deserialize, Serialize};

use crate::models::{
    BacktestSeries, DiscountCurve, LineValue, MetricSeries, ModelDeltaPv, SampledInstrument,
    ShockScenario,
};

/// Everything a validation run consumes, already converted from files by the caller.
///
/// Sequences are processed in the order given and records are emitted in the
/// same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationInputs {
    /// Baseline PV per balance-sheet line, from the model.
    pub model_pv: Vec<LineValue>,
    /// Book value per balance-sheet line, from the ledger snapshot.
    pub book_values: Vec<LineValue>,
    /// Instruments sampled for unit testing.
    #[serde(default)]
    pub instrument_sample: Vec<SampledInstrument>,
    /// The baseline discount curve the model valued against.
    pub baseline_curve: DiscountCurve,
    /// Shock scenarios the sampled instruments refer to.
    #[serde(default)]
    pub scenarios: Vec<ShockScenario>,
    /// The model's ΔPV per (instrument, scenario).
    #[serde(default)]
    pub model_delta_pv: Vec<ModelDeltaPv>,
    /// Paired modeled/realized history, one series per metric.
    #[serde(default)]
    pub backtests: Vec<BacktestSeries>,
    /// Observations of limit-monitored metrics.
    #[serde(default)]
    pub metric_series: Vec<MetricSeries>,
}
