//! Serializable run configuration.
//!
//! A run file is TOML:
//!
//! ```toml
//! [strategy]
//! kind = "long_short"
//! band_anchor = "extrema"
//! params = { atr_period = 5, upper_band_multiplier = 2.25 }
//!
//! [settings]
//! initial_cash = 100000.0
//! commission_rate = 0.0001
//!
//! [sweep]
//! objective = "sharpe"
//!
//! [[sweep.axes]]
//! name = "atr_period"
//! values = [5, 10, 20]
//! ```
//!
//! Every section except `strategy` is optional and falls back to defaults.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bandlab_core::{build_strategy, BacktestSettings, ConfigurationError, StrategyConfig};

use crate::fitness::FitnessMetric;
use crate::sweep::{ParamAxis, ParamGrid};

/// Unique identifier for a run configuration (content-addressable hash).
pub type RunId = String;

/// Errors from parsing or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigurationError),
    #[error("annualization factor must be positive, got {0}")]
    InvalidAnnualizationFactor(f64),
}

/// How per-bar returns are annualized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Bars per year (252 for daily equity data).
    pub annualization_factor: f64,
    /// Annual risk-free rate subtracted in Sharpe and Sortino.
    pub risk_free_rate: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            annualization_factor: 252.0,
            risk_free_rate: 0.0,
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.annualization_factor.is_finite() || self.annualization_factor <= 0.0 {
            return Err(ConfigError::InvalidAnnualizationFactor(
                self.annualization_factor,
            ));
        }
        Ok(())
    }
}

/// Sweep section: objective plus axes in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSpec {
    #[serde(default)]
    pub objective: FitnessMetric,
    pub axes: Vec<ParamAxis>,
}

impl SweepSpec {
    pub fn grid(&self) -> Result<ParamGrid, ConfigurationError> {
        ParamGrid::new(self.axes.clone())
    }
}

/// Everything needed to reproduce a run or a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub settings: BacktestSettings,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub sweep: Option<SweepSpec>,
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that does not depend on the bar data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        build_strategy(&self.strategy)?;
        self.settings.validate()?;
        self.metrics.validate()?;
        if let Some(sweep) = &self.sweep {
            sweep.grid()?;
        }
        Ok(())
    }

    /// Deterministic hash of the full configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

/// Read and validate a run file.
pub fn load_run_config(path: &Path) -> anyhow::Result<RunConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    RunConfig::from_toml(&text)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}
