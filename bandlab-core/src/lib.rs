//! BandLab Core — bars, rolling indicators, channel strategies, execution.
//!
//! This crate contains the deterministic single-run pipeline:
//! - Domain types (bars, signals, positions, trades) and ingestion validation
//! - Incremental indicators (true range, ATR, EMA, trailing extrema, channels)
//! - Strategy variants selected by configuration (channel breakout, long-short)
//! - Position state machine and same-bar-close ledger
//! - The bar loop producing an equity curve and trade log
//!
//! It performs no I/O.

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod strategy;

pub use engine::{run_backtest, BacktestError, BacktestSettings, RunResult};
pub use strategy::{build_strategy, ConfigurationError, Strategy, StrategyConfig, StrategyKind};
