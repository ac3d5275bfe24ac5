//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the validation
//! configuration from a YAML file or string.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::ValidationConfig;

/// Loads and validates a [`ValidationConfig`].
///
/// # File Format
///
/// ```text
/// pv_tolerance_pct: 2.0          # percent
/// unit_test_tolerance_abs: 0.02
/// backtest_r2_min: 0.7
/// backtest_slope_band: 0.1
/// limit_warning_threshold: 10    # percent of Tier 1 capital
/// limit_breach_threshold: 15
/// limits:                        # optional per-metric overrides
///   - metric_name: delta_nii
///     warning_threshold: 5000000
///     breach_threshold: 8000000
///     basis: absolute
/// ```
///
/// # Example
///
/// ```no_run
/// use irrbb_validation::config::ConfigLoader;
///
/// let config = ConfigLoader::load("./config/validation.yaml")?;
/// println!("R² threshold: {}", config.backtest_r2_min);
/// # Ok::<(), irrbb_validation::error::EngineError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from a YAML file.
    ///
    /// # Returns
    ///
    /// Returns the validated configuration, or an error if:
    /// - The file is missing (`ConfigNotFound`)
    /// - The file is not valid YAML, a required field is missing, or an
    ///   unknown field is present (`ConfigParseError`)
    /// - A field is outside its permitted range (`InvalidConfig`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<ValidationConfig> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        let config = Self::parse(&content, &path_str)?;
        debug!(path = %path_str, limits = config.limits.len(), "Loaded validation configuration");
        Ok(config)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> EngineResult<ValidationConfig> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> EngineResult<ValidationConfig> {
        let config: ValidationConfig =
            serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}
