//! Walk-forward validation — rolling train/test windows with re-optimization.
//!
//! Window sizes are fractions of the full series:
//! - train_len = floor(n * train_ratio)
//! - test_len = floor(n * test_ratio)
//!
//! Windows start at 0 and advance by test_len while
//! start + train_len + test_len <= n. Each window sweeps the grid on its
//! training slice and re-runs the winner on the test slice that follows it.
//! Aggregation averages the winning parameters across windows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use bandlab_core::domain::Bar;

use crate::runner::RunError;
use crate::split::{validate_window, ValidationReport};
use crate::sweep::{Combination, ParamGrid, ParamSweep};

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    /// Fraction of the series in each training window (default 0.6).
    pub train_ratio: f64,
    /// Fraction of the series in each test window and the step (default 0.2).
    pub test_ratio: f64,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.6,
            test_ratio: 0.2,
        }
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// Bar index ranges of one window, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub index: usize,
    pub train_start: usize,
    pub train_end: usize,
    pub test_start: usize,
    pub test_end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    pub spec: WindowSpec,
    pub report: ValidationReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardResult {
    pub windows: Vec<WindowResult>,
    /// Mean winning value per parameter; window lengths rounded.
    pub aggregated_params: BTreeMap<String, f64>,
    pub mean_train_score: Option<f64>,
    pub mean_test_score: Option<f64>,
}

/// Errors from split and walk-forward validation.
#[derive(Debug, Error)]
pub enum WalkForwardError {
    #[error("{name} must be in (0, 1), got {value}")]
    InvalidRatio { name: &'static str, value: f64 },

    #[error("train_ratio + test_ratio must not exceed 1, got {sum}")]
    RatiosExceedOne { sum: f64 },

    #[error("split leaves {train} training and {test} test bars")]
    EmptySplit { train: usize, test: usize },

    #[error("{total_bars} bars give a train window of {train_len} and a test window of {test_len}")]
    InsufficientData {
        total_bars: usize,
        train_len: usize,
        test_len: usize,
    },

    #[error("sweep failed on window {window}: {source}")]
    Sweep {
        window: usize,
        #[source]
        source: RunError,
    },
}

// ─── Window creation ─────────────────────────────────────────────────

/// Rolling window specifications for `total_bars` bars.
pub fn create_windows(
    total_bars: usize,
    config: &WalkForwardConfig,
) -> Result<Vec<WindowSpec>, WalkForwardError> {
    for (name, value) in [
        ("train_ratio", config.train_ratio),
        ("test_ratio", config.test_ratio),
    ] {
        if !value.is_finite() || value <= 0.0 || value >= 1.0 {
            return Err(WalkForwardError::InvalidRatio { name, value });
        }
    }
    let sum = config.train_ratio + config.test_ratio;
    if sum > 1.0 {
        return Err(WalkForwardError::RatiosExceedOne { sum });
    }

    let train_len = (total_bars as f64 * config.train_ratio).floor() as usize;
    let test_len = (total_bars as f64 * config.test_ratio).floor() as usize;
    if train_len == 0 || test_len == 0 || train_len + test_len > total_bars {
        return Err(WalkForwardError::InsufficientData {
            total_bars,
            train_len,
            test_len,
        });
    }

    let last_start = total_bars - train_len - test_len;
    Ok((0..=last_start)
        .step_by(test_len)
        .enumerate()
        .map(|(index, start)| WindowSpec {
            index,
            train_start: start,
            train_end: start + train_len,
            test_start: start + train_len,
            test_end: start + train_len + test_len,
        })
        .collect())
}

// ─── Walk-forward orchestration ──────────────────────────────────────

/// Optimize on each training window, evaluate on the following test window,
/// then aggregate the winners.
pub fn run_walk_forward(
    bars: &[Bar],
    sweep: &ParamSweep,
    grid: &ParamGrid,
    config: &WalkForwardConfig,
) -> Result<WalkForwardResult, WalkForwardError> {
    let specs = create_windows(bars.len(), config)?;
    tracing::info!(windows = specs.len(), bars = bars.len(), "walk-forward started");

    let mut windows = Vec::with_capacity(specs.len());
    for spec in specs {
        let train = &bars[spec.train_start..spec.train_end];
        let test = &bars[spec.test_start..spec.test_end];
        let report = validate_window(spec.index, train, test, sweep, grid)?;
        windows.push(WindowResult { spec, report });
    }

    let winners: Vec<&Combination> = windows.iter().filter_map(|w| w.report.best.as_ref()).collect();
    let aggregated_params = aggregate_params(&winners);
    let mean_train_score = mean_defined(windows.iter().map(|w| w.report.train_score));
    let mean_test_score = mean_defined(windows.iter().map(|w| w.report.test_score));

    Ok(WalkForwardResult {
        windows,
        aggregated_params,
        mean_train_score,
        mean_test_score,
    })
}

/// Per-parameter mean of the winning combinations.
///
/// Window lengths (`*_period`) are rounded to the nearest integer so the
/// aggregate is itself a runnable configuration.
pub fn aggregate_params(winners: &[&Combination]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for combination in winners {
        for (name, value) in &combination.params {
            let slot = sums.entry(name.clone()).or_insert((0.0, 0));
            slot.0 += value;
            slot.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(name, (sum, count))| {
            let mean = sum / count as f64;
            let value = if is_window_param(&name) {
                mean.round()
            } else {
                mean
            };
            (name, value)
        })
        .collect()
}

fn is_window_param(name: &str) -> bool {
    name.ends_with("_period")
}

fn mean_defined(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.flatten().collect();
    if defined.is_empty() {
        return None;
    }
    Some(defined.iter().sum::<f64>() / defined.len() as f64)
}
