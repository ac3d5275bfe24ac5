//! Validation engine for Interest Rate Risk in the Banking Book (IRRBB) models.
//!
//! This crate re-runs the quantitative checks of a model validation against
//! reference data: PV reconciliation against book values, instrument-level
//! ΔPV unit tests under rate shocks, NII/EVE backtests, and risk limit
//! evaluation. The outcome is a single serializable [`models::ValidationRunResult`].

#![warn(missing_docs)]

pub mod checks;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod numeric;
