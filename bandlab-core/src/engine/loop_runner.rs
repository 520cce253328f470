//! Bar-by-bar event loop — a synchronous fold over the bar sequence.
//!
//! Per bar t:
//! 1. Ask the strategy for a signal, given the side carried from bar t-1.
//!    No signal is requested until every indicator is warmed up.
//! 2. The position manager turns (position, signal, equity) into a transition.
//! 3. The ledger fills it at bar t's close.
//! 4. Mark equity at bar t's close and append it to the curve.
//!
//! On the final bar, entries are suppressed (they could only round-trip at
//! the same price) and any open position is force-closed at the last close.

use crate::domain::{validate_bars, Bar, ExitReason, Signal, TradeRecord};
use crate::strategy::Strategy;

use super::ledger::Ledger;
use super::position_manager::{decide, Transition};
use super::state::{BacktestError, BacktestSettings, EquityPoint, RunResult};

/// Run a backtest of `strategy` over `bars`.
///
/// Validation happens before any simulation: bad data yields a
/// `DataError`, bad settings or windows longer than the data a
/// `ConfigurationError`.
pub fn run_backtest(
    bars: &[Bar],
    strategy: &dyn Strategy,
    settings: &BacktestSettings,
) -> Result<RunResult, BacktestError> {
    validate_bars(bars)?;
    settings.validate()?;
    strategy.check_bar_count(bars.len())?;

    let indicators = strategy.compute_indicators(bars);
    let sizing = strategy.sizing();
    let warmup_bars = strategy.warmup_bars();
    let rate = settings.commission_rate;
    let last = bars.len() - 1;

    let mut ledger = Ledger::new(settings.initial_cash);
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len());

    for (t, bar) in bars.iter().enumerate() {
        let side = ledger.position().side();
        let signal = if t < warmup_bars {
            Signal::None
        } else {
            strategy.generate_signal(bars, t, &indicators, side)
        };

        let transition = match decide(ledger.position(), signal, ledger.equity(bar.close), &sizing)
        {
            Transition::Open { .. } if t == last => Transition::Hold,
            other => other,
        };

        let (next, trade) = ledger.apply(transition, t, bar, rate);
        ledger = next;
        trades.extend(trade);

        if t == last && !ledger.position().is_flat() {
            tracing::debug!(bar = t, price = bar.close, "end of data: forcing close");
            let (next, trade) = ledger.close(t, bar, ExitReason::EndOfData, rate);
            ledger = next;
            trades.extend(trade);
        }

        equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity: ledger.equity(bar.close),
            side: ledger.position().side(),
        });
    }

    let final_equity = ledger.equity(bars[last].close);
    verify_conservation(settings.initial_cash, final_equity, &trades);

    Ok(RunResult {
        equity_curve,
        trades,
        initial_cash: settings.initial_cash,
        final_equity,
        bar_count: bars.len(),
        warmup_bars,
    })
}

/// final_equity == initial_cash + Σ net_pnl. Panics in debug builds if violated.
fn verify_conservation(initial_cash: f64, final_equity: f64, trades: &[TradeRecord]) {
    #[cfg(debug_assertions)]
    {
        let expected = initial_cash + trades.iter().map(|t| t.net_pnl).sum::<f64>();
        assert!(
            final_equity == expected,
            "equity conservation violated: final={final_equity}, initial + Σ net_pnl = {expected}"
        );
    }
    #[cfg(not(debug_assertions))]
    let _ = (initial_cash, final_equity, trades);
}
