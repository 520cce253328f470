//! Trailing extrema — highest/lowest value of a price field over a window.
//!
//! Value at bar t covers bars [t - period + 1, t], current bar included.
//! Exit rules that must not see the current bar read index t - 1.
//! Lookback: period - 1.

use super::rolling::{fold_series, RollingExtremum};
use super::Indicator;
use crate::domain::Bar;

/// Bar field the extremum is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    High,
    Low,
    Close,
}

impl PriceField {
    pub fn extract(&self, bar: &Bar) -> f64 {
        match self {
            PriceField::High => bar.high,
            PriceField::Low => bar.low,
            PriceField::Close => bar.close,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrailingExtremum {
    period: usize,
    field: PriceField,
    highest: bool,
    name: String,
}

impl TrailingExtremum {
    pub fn highest(period: usize, field: PriceField) -> Self {
        assert!(period >= 1, "trailing window must be >= 1");
        Self {
            period,
            field,
            highest: true,
            name: format!("highest_{}_{period}", field.label()),
        }
    }

    pub fn lowest(period: usize, field: PriceField) -> Self {
        assert!(period >= 1, "trailing window must be >= 1");
        Self {
            period,
            field,
            highest: false,
            name: format!("lowest_{}_{period}", field.label()),
        }
    }
}

impl Indicator for TrailingExtremum {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let values: Vec<f64> = bars.iter().map(|b| self.field.extract(b)).collect();
        if self.highest {
            rolling_max(&values, self.period)
        } else {
            rolling_min(&values, self.period)
        }
    }
}

/// Trailing max over `period` values, NaN during warm-up.
pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }
    let mut acc = RollingExtremum::max(period);
    fold_series(values, |v| acc.push(v))
}

/// Trailing min over `period` values, NaN during warm-up.
pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }
    let mut acc = RollingExtremum::min(period);
    fold_series(values, |v| acc.push(v))
}
