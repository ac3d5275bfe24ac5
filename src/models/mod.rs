//! Core data models for the IRRBB validation engine.
//!
//! This module contains the inputs consumed from the upstream model and
//! reference data, and the immutable records produced by the checkers.

mod cash_flow;
mod curve;
mod history;
mod validation_result;

pub use cash_flow::{CashFlow, CashFlowSeries, LineValue, ModelDeltaPv, SampledInstrument};
pub use curve::{CurveGapPolicy, CurvePoint, DiscountCurve, ShockScenario};
pub use history::{
    BacktestMetric, BacktestPoint, BacktestSeries, LimitBasis, MetricObservation, MetricSeries,
};
pub use validation_result::{
    AuditStep, AuditTrace, BacktestResult, CheckKind, CheckStatus, Finding, LimitClassification,
    LimitEvaluation, LimitTrend, OverallStatus, ReasonCode, ReconciliationRecord, Severity,
    TrendDirection, UnavailableCheck, UnitTestRecord, ValidationRunResult,
};
