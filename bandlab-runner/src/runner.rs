//! Backtest runner — wires strategy construction, the engine, and metrics.
//!
//! Entry points:
//! - `run_single()`: pre-loaded bars plus explicit configs, no I/O. Used by
//!   sweeps and walk-forward.
//! - `run_from_config()`: pre-loaded bars plus a `RunConfig`.
//! - `run_files()`: reads a config file and a CSV file, then runs.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bandlab_core::domain::Bar;
use bandlab_core::{
    build_strategy, run_backtest, BacktestError, BacktestSettings, RunResult, StrategyConfig,
};

use crate::config::{load_run_config, ConfigError, MetricsConfig, RunConfig};
use crate::data_loader::{load_bars_csv, LoadError};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Backtest(#[from] BacktestError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// `StrategyConfig::full_hash` of `config`.
    pub config_hash: String,
    pub config: StrategyConfig,
    pub settings: BacktestSettings,
    pub metrics: PerformanceMetrics,
    pub run: RunResult,
}

/// Run one configuration over pre-loaded bars.
pub fn run_single(
    bars: &[Bar],
    config: &StrategyConfig,
    settings: &BacktestSettings,
    metrics_config: &MetricsConfig,
) -> Result<BacktestResult, RunError> {
    metrics_config.validate()?;
    let strategy = build_strategy(config).map_err(BacktestError::from)?;
    let run = run_backtest(bars, strategy.as_ref(), settings)?;
    let metrics = PerformanceMetrics::compute(&run, metrics_config);

    Ok(BacktestResult {
        config_hash: config.full_hash(),
        config: config.clone(),
        settings: *settings,
        metrics,
        run,
    })
}

/// Run the strategy of a `RunConfig` (its sweep section is ignored).
pub fn run_from_config(bars: &[Bar], config: &RunConfig) -> Result<BacktestResult, RunError> {
    run_single(bars, &config.strategy, &config.settings, &config.metrics)
}

/// Read a run file and a bar CSV, then run.
pub fn run_files(config_path: &Path, bars_path: &Path) -> anyhow::Result<BacktestResult> {
    let config = load_run_config(config_path)?;
    let bars = load_bars_csv(bars_path)
        .with_context(|| format!("failed to load bars: {}", bars_path.display()))?;
    run_from_config(&bars, &config)
        .with_context(|| format!("backtest failed for {}", config_path.display()))
}
