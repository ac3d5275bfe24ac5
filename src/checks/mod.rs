//! The four validation checkers.
//!
//! Each checker is a pure function of its inputs that produces immutable
//! records plus an audit step. The checkers are independent of one another;
//! the engine runner sequences them and the aggregator combines their output.

mod backtest;
mod pv_reconciliation;
mod risk_limits;
mod unit_test;

pub use backtest::{BacktestRun, Regression, grade_backtest, ols_regression, run_backtest};
pub use pv_reconciliation::{ReconciliationResult, reconcile_present_values};
pub use risk_limits::{
    LimitEvaluationResult, classify, evaluate_limits, evaluate_risk_limits, to_limit_basis,
    track_trend,
};
pub use unit_test::{UnitTestResult, run_unit_tests, unit_test_tolerance};
