//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: EMA[period-1] = SMA of the first `period` values.
//! Lookback: period - 1.

use super::rolling::{fold_series, EmaState};
use super::Indicator;
use crate::domain::Bar;

/// Which per-bar price the EMA smooths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Close,
    /// (high + low + close) / 3
    Typical,
}

impl PriceSource {
    pub fn extract(&self, bar: &Bar) -> f64 {
        match self {
            PriceSource::Close => bar.close,
            PriceSource::Typical => bar.typical_price(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PriceSource::Close => "close",
            PriceSource::Typical => "typical",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    source: PriceSource,
    name: String,
}

impl Ema {
    pub fn new(period: usize, source: PriceSource) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            source,
            name: format!("ema_{}_{period}", source.label()),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let prices: Vec<f64> = bars.iter().map(|b| self.source.extract(b)).collect();
        ema_of_series(&prices, self.period)
    }
}

/// EMA of an arbitrary pre-extracted series.
/// Used by composed indicators (the channel middle line).
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }
    let mut state = EmaState::new(period);
    fold_series(values, |v| state.push(v))
}

/// Per-bar (high + low + close) / 3.
pub fn typical_price(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(Bar::typical_price).collect()
}
