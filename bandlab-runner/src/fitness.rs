//! Fitness function — objective metric selector for sweep ranking.

use std::cmp::Ordering;

use crate::metrics::PerformanceMetrics;
use serde::{Deserialize, Serialize};

/// Which metric a sweep optimizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    #[default]
    Sharpe,
    Sortino,
    TotalReturn,
    AnnualizedReturn,
    WinRate,
    /// Ranked on drawdown depth, shallowest first.
    MaxDrawdown,
    /// Lowest first.
    Volatility,
}

impl FitnessMetric {
    /// Objective value for ranking. `None` means the run cannot be ranked.
    ///
    /// MaxDrawdown yields the depth `|max_drawdown|`, so every objective is
    /// compared on its natural magnitude.
    pub fn score(&self, metrics: &PerformanceMetrics) -> Option<f64> {
        let value = match self {
            Self::Sharpe => metrics.sharpe,
            Self::Sortino => metrics.sortino,
            Self::TotalReturn => Some(metrics.total_return),
            Self::AnnualizedReturn => metrics.annualized_return,
            Self::WinRate => metrics.win_rate,
            Self::MaxDrawdown => Some(metrics.max_drawdown.abs()),
            Self::Volatility => metrics.volatility,
        };
        value.filter(|v| v.is_finite())
    }

    /// Whether larger scores are better (argmax) or smaller (argmin).
    pub fn is_higher_better(&self) -> bool {
        !matches!(self, Self::MaxDrawdown | Self::Volatility)
    }

    /// True if score `a` is strictly better than `b`.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        if self.is_higher_better() {
            a > b
        } else {
            a < b
        }
    }

    /// Ordering that puts the better score first. Equal scores compare equal,
    /// so a stable sort keeps them in their original order.
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        if self.is_higher_better() {
            ord.reverse()
        } else {
            ord
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sharpe => "sharpe",
            Self::Sortino => "sortino",
            Self::TotalReturn => "total_return",
            Self::AnnualizedReturn => "annualized_return",
            Self::WinRate => "win_rate",
            Self::MaxDrawdown => "max_drawdown",
            Self::Volatility => "volatility",
        }
    }
}
