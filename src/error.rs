//! Error types for the IRRBB validation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can abort a computation. Problems that
//! concern a single record (a missing balance-sheet line, a missing model
//! figure) are not errors: they are reported as failed records instead.

use thiserror::Error;

/// The main error type for the IRRBB validation engine.
///
/// # Example
///
/// ```
/// use irrbb_validation::error::EngineError;
///
/// let error = EngineError::CurveGap {
///     currency: "EUR".to_string(),
///     period: 7,
/// };
/// assert_eq!(error.to_string(), "Discount curve (EUR) has no rate for period 7");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A configuration field held a value outside its permitted range.
    #[error("Invalid configuration field '{field}': {message}")]
    InvalidConfig {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// The discount curve cannot supply a rate for a required period.
    #[error("Discount curve ({currency}) has no rate for period {period}")]
    CurveGap {
        /// Currency of the curve.
        currency: String,
        /// The period for which no rate could be resolved.
        period: u32,
    },

    /// A shock scenario references a tenor that is not on the curve grid.
    #[error("Scenario '{scenario}' references tenor {tenor} which is not on the curve grid")]
    UnknownTenor {
        /// Name of the scenario.
        scenario: String,
        /// The tenor absent from the curve.
        tenor: u32,
    },

    /// A discount curve violates its structural invariants.
    #[error("Invalid discount curve: {message}")]
    InvalidCurve {
        /// A description of the violated invariant.
        message: String,
    },

    /// A cash flow is denominated in a different currency than the curve.
    #[error(
        "Cash flow for instrument '{instrument_id}' is in {flow_currency} but the curve is {curve_currency}"
    )]
    CurrencyMismatch {
        /// The instrument owning the cash flow.
        instrument_id: String,
        /// Currency of the cash flow.
        flow_currency: String,
        /// Currency of the discount curve.
        curve_currency: String,
    },

    /// A backtest has fewer usable observations than the configured minimum.
    #[error("Insufficient data for {metric} backtest: {available} usable periods, {required} required")]
    InsufficientData {
        /// The metric being backtested.
        metric: String,
        /// The minimum sample size.
        required: usize,
        /// The number of usable observations.
        available: usize,
    },

    /// The regression cannot be estimated because modeled values do not vary.
    #[error("Degenerate regression for {metric} backtest: modeled values have zero variance")]
    DegenerateRegression {
        /// The metric being backtested.
        metric: String,
    },

    /// A validation result or input could not be serialized.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// A description of the serialization failure.
        message: String,
    },

    /// A general calculation error occurred (overflow, invalid operand).
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
