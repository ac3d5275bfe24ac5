//! Numeric utilities shared by the checkers.
//!
//! This module contains present-value computation from cash flows and a
//! discount curve, additive rate shocks, and the difference/tolerance
//! helpers used for every pass/fail comparison.

mod present_value;
mod tolerance;

pub use present_value::{apply_shock, compounding_factor, present_value};
pub use tolerance::{
    RELATIVE_DIFF_EPSILON, absolute_difference, relative_difference, within_tolerance,
};
