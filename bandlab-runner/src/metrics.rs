//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity path and/or trade list in, value
//! out. Degenerate inputs (no trades, zero variance, too few bars) yield
//! `None`, never NaN and never a panic.
//!
//! The equity path is the initial cash followed by one sample per bar, so the
//! first per-bar return already reflects any fill on bar 0.

use bandlab_core::domain::TradeRecord;
use bandlab_core::RunResult;
use serde::{Deserialize, Serialize};

use crate::config::MetricsConfig;

/// Below this, a standard deviation counts as zero.
const ZERO_STD: f64 = 1e-15;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// final_equity / initial_cash - 1.
    pub total_return: f64,
    pub annualized_return: Option<f64>,
    /// Annualized standard deviation of per-bar returns.
    pub volatility: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    /// Deepest peak-to-trough decline as a non-positive fraction.
    pub max_drawdown: f64,
    pub win_rate: Option<f64>,
    pub profit_factor: Option<f64>,
    pub trade_count: usize,
    pub forced_close_count: usize,
}

impl PerformanceMetrics {
    /// Compute all metrics for one run.
    pub fn compute(result: &RunResult, config: &MetricsConfig) -> Self {
        let path = equity_path(result);
        let returns = period_returns(&path);
        let factor = config.annualization_factor;

        Self {
            total_return: total_return(result.initial_cash, result.final_equity),
            annualized_return: annualized_return(
                result.initial_cash,
                result.final_equity,
                returns.len(),
                factor,
            ),
            volatility: volatility(&returns, factor),
            sharpe: sharpe_ratio(&returns, config.risk_free_rate, factor),
            sortino: sortino_ratio(&returns, config.risk_free_rate, factor),
            max_drawdown: max_drawdown(&path),
            win_rate: win_rate(&result.trades),
            profit_factor: profit_factor(&result.trades),
            trade_count: result.trades.len(),
            forced_close_count: result.forced_close_count(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: final / initial - 1.
pub fn total_return(initial: f64, final_equity: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    final_equity / initial - 1.0
}

/// Compound growth rate per year, given `periods` per-bar returns.
///
/// `None` with no elapsed periods or a non-positive final equity.
pub fn annualized_return(
    initial: f64,
    final_equity: f64,
    periods: usize,
    annualization_factor: f64,
) -> Option<f64> {
    if periods == 0 || initial <= 0.0 || final_equity <= 0.0 {
        return None;
    }
    let years = periods as f64 / annualization_factor;
    Some((final_equity / initial).powf(1.0 / years) - 1.0)
}

/// Annualized sample standard deviation of per-bar returns.
pub fn volatility(returns: &[f64], annualization_factor: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    Some(std_dev(returns) * annualization_factor.sqrt())
}

/// Annualized Sharpe ratio.
///
/// Sharpe = mean(r - rf / factor) / std(r) * sqrt(factor).
/// `None` if the returns have zero variance or there are fewer than 2.
pub fn sharpe_ratio(
    returns: &[f64],
    risk_free_rate: f64,
    annualization_factor: f64,
) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let std = std_dev(returns);
    if std < ZERO_STD {
        return None;
    }
    let per_period_rf = risk_free_rate / annualization_factor;
    let mean_excess = mean_f64(returns) - per_period_rf;
    Some(mean_excess / std * annualization_factor.sqrt())
}

/// Annualized Sortino ratio.
///
/// Downside deviation is sqrt(Σ min(excess, 0)² / n) over all returns.
/// `None` when no excess return is negative.
pub fn sortino_ratio(
    returns: &[f64],
    risk_free_rate: f64,
    annualization_factor: f64,
) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let per_period_rf = risk_free_rate / annualization_factor;
    let excess: Vec<f64> = returns.iter().map(|r| r - per_period_rf).collect();

    let downside_sq: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside_sq / excess.len() as f64).sqrt();
    if downside_std < ZERO_STD {
        return None;
    }
    Some(mean_f64(&excess) / downside_std * annualization_factor.sqrt())
}

/// Maximum drawdown: min over t of equity[t] / running_max - 1.
///
/// Returns 0.0 for an empty or never-declining path.
pub fn max_drawdown(equity_path: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &eq in equity_path {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min(eq / peak - 1.0);
        }
    }
    max_dd
}

/// Fraction of trades with positive net PnL. `None` with no trades.
pub fn win_rate(trades: &[TradeRecord]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    Some(winners as f64 / trades.len() as f64)
}

/// Gross profit / gross loss over net PnL. `None` without a losing trade.
pub fn profit_factor(trades: &[TradeRecord]) -> Option<f64> {
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl.abs())
        .sum();

    if gross_loss == 0.0 {
        return None;
    }
    Some(gross_profit / gross_loss)
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Initial cash followed by the per-bar equity samples.
pub fn equity_path(result: &RunResult) -> Vec<f64> {
    std::iter::once(result.initial_cash)
        .chain(result.equity_curve.iter().map(|p| p.equity))
        .collect()
}

/// Simple returns between consecutive equity samples.
pub fn period_returns(equity_path: &[f64]) -> Vec<f64> {
    equity_path
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
