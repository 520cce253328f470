//! Backtesting engine — position state machine, ledger, and the bar loop.
//!
//! Data flows one way per run: indicators are precomputed by the strategy,
//! then each bar produces a signal, a transition, an optional fill, and an
//! equity sample. A run shares nothing mutable with any other run.

pub mod ledger;
pub mod loop_runner;
pub mod position_manager;
pub mod state;

pub use ledger::Ledger;
pub use loop_runner::run_backtest;
pub use position_manager::{decide, Sizing, Transition};
pub use state::{BacktestError, BacktestSettings, EquityPoint, RunResult};
