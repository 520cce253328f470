//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR is the simple rolling mean of TR over `period` bars.
//! Lookback: period - 1.

use super::rolling::{fold_series, RollingMean};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Compute the True Range series from bars.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut prev_close: Option<f64> = None;
    bars.iter()
        .map(|bar| {
            let range = bar.high - bar.low;
            let tr = match prev_close {
                Some(pc) => range.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
                None => range,
            };
            prev_close = Some(bar.close);
            tr
        })
        .collect()
}

/// ATR series for `period`; NaN during warmup, all NaN for a zero period.
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; bars.len()];
    }
    Atr::new(period).compute(bars)
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let tr = true_range(bars);
        let mut mean = RollingMean::new(self.period);
        // True range is non-negative; clamp away any rounding residue.
        fold_series(&tr, |v| mean.push(v).map(|m| m.max(0.0)))
    }
}
