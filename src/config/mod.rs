//! Configuration loading and management for the validation engine.
//!
//! This module provides functionality to load tolerances, backtest accuracy
//! thresholds and risk limits from YAML, rejecting unknown or missing fields
//! and out-of-range values at load time.
//!
//! # Example
//!
//! ```no_run
//! use irrbb_validation::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/validation.yaml").unwrap();
//! println!("PV tolerance: {}%", config.pv_tolerance_pct);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    DEFAULT_BACKTEST_MIN_SAMPLE, LimitConfig, MIN_REGRESSION_SAMPLE, SlopePolicy, ValidationConfig,
};
