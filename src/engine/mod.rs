//! Validation run orchestration.
//!
//! This module contains the in-memory inputs of a run, the aggregator that
//! derives the overall status, and the runner that sequences the checkers.

mod aggregator;
mod inputs;
mod runner;

pub use aggregator::{
    AggregateResult, BACKTEST_FAIL, BACKTEST_WARNING, CHECK_UNAVAILABLE, CheckOutcomes,
    LIMIT_BREACH, LIMIT_WARNING, RECONCILIATION_FAIL, UNIT_TEST_FAIL, aggregate,
    collect_findings, overall_status,
};
pub use inputs::ValidationInputs;
pub use runner::ValidationEngine;
