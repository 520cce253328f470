//! Indicator engine — derived numeric series computed from raw bars.
//!
//! Every indicator is a fold of an incremental accumulator from [`rolling`]
//! over the bar sequence, so computation is O(1) amortized per bar. Outputs
//! are aligned 1:1 with the bars; warm-up entries are `f64::NAN`.
//!
//! Multi-series indicators (the channel) are exposed as separate named
//! instances per band, keeping the single-series `Indicator` trait unchanged.

pub mod atr;
pub mod channel;
pub mod ema;
pub mod extrema;
pub mod rolling;

pub use atr::{atr, true_range, Atr};
pub use channel::{BandAnchor, Channel, ChannelBand, ChannelSeries, ChannelSpec};
pub use ema::{ema_of_series, typical_price, Ema, PriceSource};
pub use extrema::{rolling_max, rolling_min, PriceField, TrailingExtremum};
pub use rolling::{EmaState, RollingExtremum, RollingMean};

use crate::domain::Bar;
use std::collections::HashMap;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warm-up).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Unique name including parameters (e.g., "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars that stay undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Container for precomputed indicator values.
///
/// Built once before the bar loop, then queried by bar index during the loop.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every indicator over `bars` and collect the results.
    pub fn compute_all(bars: &[Bar], indicators: &[Box<dyn Indicator>]) -> Self {
        let mut values = Self::new();
        for indicator in indicators {
            let series = indicator.compute(bars);
            debug_assert_eq!(
                series.len(),
                bars.len(),
                "indicator '{}' produced {} values for {} bars",
                indicator.name(),
                series.len(),
                bars.len()
            );
            values.insert(indicator.name(), series);
        }
        values
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Value at `bar_index`, or `None` when the series is missing, the index is
    /// out of range, or the value is still in warm-up.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
            .filter(|v| !v.is_nan())
    }

    /// Get the full series for a named indicator.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Bars with open = high = low = close = `price`.
#[cfg(test)]
pub fn flat_bars(price: f64, n: usize) -> Vec<Bar> {
    make_bars(&vec![price; n])
        .into_iter()
        .map(|b| Bar {
            open: price,
            high: price,
            low: price,
            ..b
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
