//! Run settings, run result, and the pipeline error type.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DataError, PositionSide, TradeRecord};
use crate::strategy::ConfigurationError;

/// Run-level settings shared by every combination of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_cash: f64,
    /// Fraction of fill notional charged per leg.
    pub commission_rate: f64,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_cash: 100_000.0,
            commission_rate: 0.0001,
        }
    }
}

impl BacktestSettings {
    pub fn new(initial_cash: f64, commission_rate: f64) -> Self {
        Self {
            initial_cash,
            commission_rate,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(ConfigurationError::InvalidInitialCash(self.initial_cash));
        }
        if !self.commission_rate.is_finite() || self.commission_rate < 0.0 {
            return Err(ConfigurationError::InvalidCommissionRate(
                self.commission_rate,
            ));
        }
        Ok(())
    }
}

/// One equity-curve sample, taken at a bar's close after any fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
    /// Exposure held after this bar's fills.
    pub side: PositionSide,
}

/// Output of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    pub initial_cash: f64,
    pub final_equity: f64,
    pub bar_count: usize,
    pub warmup_bars: usize,
}

impl RunResult {
    /// Equity values without timestamps, in bar order.
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }

    pub fn forced_close_count(&self) -> usize {
        self.trades.iter().filter(|t| t.is_forced_close()).count()
    }
}

/// Why a single backtest could not run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}
