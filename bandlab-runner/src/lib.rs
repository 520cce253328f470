//! BandLab Runner — metrics, configuration, parameter sweeps, walk-forward.
//!
//! This crate builds on `bandlab-core` to provide:
//! - Performance metrics and objective functions over a finished run
//! - TOML run configuration and CSV bar ingestion
//! - Single-run orchestration (`run_single`, `run_files`)
//! - Parallel grid and random-search sweeps with failure isolation
//! - Train/test split and rolling walk-forward validation
//! - JSON and CSV export of results

pub mod config;
pub mod data_loader;
pub mod export;
pub mod fitness;
pub mod metrics;
pub mod runner;
pub mod split;
pub mod sweep;
pub mod walk_forward;

pub use config::{load_run_config, ConfigError, MetricsConfig, RunConfig, SweepSpec};
pub use data_loader::{load_bars_csv, read_bars_csv, LoadError};
pub use export::{export_equity_csv, export_json, export_sweep_csv, export_trades_csv};
pub use fitness::FitnessMetric;
pub use metrics::PerformanceMetrics;
pub use runner::{run_files, run_from_config, run_single, BacktestResult, RunError};
pub use split::{optimize_and_validate, split_bars, ValidationReport, DEFAULT_TRAIN_RATIO};
pub use sweep::{
    Combination, ParamAxis, ParamGrid, ParamSweep, RankedEntry, SweepEntry, SweepOutcome,
    SweepResults,
};
pub use walk_forward::{
    aggregate_params, create_windows, run_walk_forward, WalkForwardConfig, WalkForwardError,
    WalkForwardResult, WindowResult, WindowSpec,
};
