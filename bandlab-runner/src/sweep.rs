//! Parameter sweep utilities for grid and random search.
//!
//! A grid is an ordered list of named axes. Combinations are enumerated as a
//! cartesian product in declaration order: the first axis is outermost, the
//! last axis varies fastest. Each combination overrides the base
//! `StrategyConfig` and runs the full single-run pipeline independently, so
//! combinations can be dispatched across rayon workers with nothing shared
//! except the read-only bars.
//!
//! A combination that fails (e.g. a window longer than the data) is recorded
//! with its error and left out of the ranking; the sweep carries on.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use bandlab_core::domain::{validate_bars, Bar};
use bandlab_core::{BacktestError, BacktestSettings, ConfigurationError, StrategyConfig};

use crate::config::MetricsConfig;
use crate::fitness::FitnessMetric;
use crate::runner::{run_single, BacktestResult, RunError};

// ─── Grid ────────────────────────────────────────────────────────────

/// One named parameter and its candidate values, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamAxis {
    pub name: String,
    pub values: Vec<f64>,
}

impl ParamAxis {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// A validated parameter grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    axes: Vec<ParamAxis>,
    size: usize,
}

impl ParamGrid {
    /// Rejects an empty grid, empty or non-finite axes, and repeated names.
    pub fn new(axes: Vec<ParamAxis>) -> Result<Self, ConfigurationError> {
        if axes.is_empty() {
            return Err(ConfigurationError::InvalidGrid("grid has no axes".into()));
        }
        let mut seen = HashSet::new();
        let mut size = 1_usize;
        for axis in &axes {
            if !seen.insert(axis.name.as_str()) {
                return Err(ConfigurationError::InvalidGrid(format!(
                    "axis '{}' declared twice",
                    axis.name
                )));
            }
            if axis.values.is_empty() {
                return Err(ConfigurationError::InvalidGrid(format!(
                    "axis '{}' has no values",
                    axis.name
                )));
            }
            if axis.values.iter().any(|v| !v.is_finite()) {
                return Err(ConfigurationError::InvalidGrid(format!(
                    "axis '{}' has a non-finite value",
                    axis.name
                )));
            }
            size = size.checked_mul(axis.values.len()).ok_or_else(|| {
                ConfigurationError::InvalidGrid("grid size overflows".into())
            })?;
        }
        Ok(Self { axes, size })
    }

    pub fn axes(&self) -> &[ParamAxis] {
        &self.axes
    }

    /// Total number of combinations.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The combination at `index` in enumeration order.
    ///
    /// Decodes `index` as a mixed-radix number whose last digit is the last axis.
    pub fn combination(&self, index: usize) -> Option<Combination> {
        if index >= self.size {
            return None;
        }
        let mut rest = index;
        let mut params = vec![(String::new(), 0.0); self.axes.len()];
        for (slot, axis) in params.iter_mut().zip(&self.axes).rev() {
            let n = axis.values.len();
            *slot = (axis.name.clone(), axis.values[rest % n]);
            rest /= n;
        }
        Some(Combination { index, params })
    }

    /// Every combination, outer axis first.
    pub fn combinations(&self) -> Vec<Combination> {
        (0..self.size).filter_map(|i| self.combination(i)).collect()
    }

    /// `n` distinct combinations drawn uniformly with a seeded RNG, returned
    /// in grid order. Asking for more than the grid holds returns all of it.
    pub fn sample(&self, n: usize, seed: u64) -> Vec<Combination> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut picked =
            rand::seq::index::sample(&mut rng, self.size, n.min(self.size)).into_vec();
        picked.sort_unstable();
        picked
            .into_iter()
            .filter_map(|i| self.combination(i))
            .collect()
    }
}

/// One point of a grid: parameter overrides in axis order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    /// Position in the grid's enumeration order.
    pub index: usize,
    pub params: Vec<(String, f64)>,
}

impl Combination {
    /// `base` with this combination's parameters overridden.
    pub fn apply(&self, base: &StrategyConfig) -> StrategyConfig {
        let mut config = base.clone();
        for (name, value) in &self.params {
            config.params.insert(name.clone(), *value);
        }
        config
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

// ─── Sweep executor ──────────────────────────────────────────────────

/// Parameter sweep executor.
///
/// Runs one independent backtest per combination, in parallel by default.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    base: StrategyConfig,
    settings: BacktestSettings,
    metrics: MetricsConfig,
    objective: FitnessMetric,
    parallel: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl ParamSweep {
    pub fn new(base: StrategyConfig, objective: FitnessMetric) -> Self {
        Self {
            base,
            settings: BacktestSettings::default(),
            metrics: MetricsConfig::default(),
            objective,
            parallel: true,
            cancel: None,
        }
    }

    pub fn with_settings(mut self, settings: BacktestSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    /// Enables or disables parallel execution. Results are identical either way.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Once `flag` is set, combinations not yet dispatched are skipped.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn objective(&self) -> FitnessMetric {
        self.objective
    }

    /// Sweep the full grid.
    pub fn sweep(&self, bars: &[Bar], grid: &ParamGrid) -> Result<SweepResults, RunError> {
        self.sweep_combinations(bars, grid.combinations(), |_, _, _| {})
    }

    /// Sweep the full grid, reporting progress.
    ///
    /// The callback is invoked after each combination completes with:
    /// - Number of combinations finished so far
    /// - Total number of combinations
    /// - The finished entry
    pub fn sweep_with_progress<F>(
        &self,
        bars: &[Bar],
        grid: &ParamGrid,
        progress: F,
    ) -> Result<SweepResults, RunError>
    where
        F: Fn(usize, usize, &SweepEntry) + Send + Sync,
    {
        self.sweep_combinations(bars, grid.combinations(), progress)
    }

    /// Sweep an explicit list of combinations (e.g. from `ParamGrid::sample`).
    ///
    /// Bars and metric settings are checked once up front: a data error
    /// would fail every combination identically, so it fails the sweep.
    pub fn sweep_combinations<F>(
        &self,
        bars: &[Bar],
        combinations: Vec<Combination>,
        progress: F,
    ) -> Result<SweepResults, RunError>
    where
        F: Fn(usize, usize, &SweepEntry) + Send + Sync,
    {
        validate_bars(bars).map_err(BacktestError::from)?;
        self.metrics.validate()?;

        let total = combinations.len();
        tracing::info!(
            combinations = total,
            objective = self.objective.as_str(),
            parallel = self.parallel,
            "sweep started"
        );

        let done = AtomicUsize::new(0);
        let step = |combination: &Combination| -> Option<SweepEntry> {
            if self.is_cancelled() {
                return None;
            }
            let entry = self.evaluate(bars, combination);
            let finished = done.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            progress(finished, total, &entry);
            Some(entry)
        };

        let outcomes: Vec<Option<SweepEntry>> = if self.parallel {
            combinations.par_iter().map(step).collect()
        } else {
            combinations.iter().map(step).collect()
        };

        let skipped = outcomes.iter().filter(|o| o.is_none()).count();
        let entries: Vec<SweepEntry> = outcomes.into_iter().flatten().collect();
        let results = SweepResults {
            objective: self.objective,
            entries,
            skipped,
        };

        tracing::info!(
            completed = results.completed().count(),
            failed = results.failure_count(),
            skipped,
            "sweep finished"
        );
        Ok(results)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(AtomicOrdering::SeqCst))
    }

    /// Run a single combination with this sweep's base config and settings.
    pub fn run(&self, bars: &[Bar], combination: &Combination) -> Result<BacktestResult, RunError> {
        let config = combination.apply(&self.base);
        run_single(bars, &config, &self.settings, &self.metrics)
    }

    fn evaluate(&self, bars: &[Bar], combination: &Combination) -> SweepEntry {
        let outcome = match self.run(bars, combination) {
            Ok(result) => SweepOutcome::Completed(Box::new(result)),
            Err(e) => {
                tracing::warn!(combination = %combination, error = %e, "combination failed");
                SweepOutcome::Failed(e.to_string())
            }
        };
        SweepEntry {
            combination: combination.clone(),
            outcome,
        }
    }
}

// ─── Results ─────────────────────────────────────────────────────────

/// What happened to one combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SweepOutcome {
    Completed(Box<BacktestResult>),
    /// The error message of a failed run.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub combination: Combination,
    pub outcome: SweepOutcome,
}

impl SweepEntry {
    pub fn result(&self) -> Option<&BacktestResult> {
        match &self.outcome {
            SweepOutcome::Completed(result) => Some(result.as_ref()),
            SweepOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SweepOutcome::Completed(_) => None,
            SweepOutcome::Failed(message) => Some(message),
        }
    }
}

/// A completed combination with a defined objective value.
#[derive(Debug, Clone, Copy)]
pub struct RankedEntry<'a> {
    pub combination: &'a Combination,
    pub result: &'a BacktestResult,
    pub score: f64,
}

/// Results from a parameter sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    pub objective: FitnessMetric,
    /// Dispatched combinations, in enumeration order.
    pub entries: Vec<SweepEntry>,
    /// Combinations never dispatched because the sweep was cancelled.
    pub skipped: usize,
}

impl SweepResults {
    pub fn entries(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn completed(&self) -> impl Iterator<Item = &SweepEntry> {
        self.entries.iter().filter(|e| e.result().is_some())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SweepEntry> {
        self.entries.iter().filter(|e| e.error().is_some())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Completed entries with a defined objective, best first.
    ///
    /// The sort is stable, so equal scores stay in enumeration order.
    pub fn ranked(&self) -> Vec<RankedEntry<'_>> {
        let mut ranked: Vec<RankedEntry<'_>> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let result = entry.result()?;
                let score = self.objective.score(&result.metrics)?;
                Some(RankedEntry {
                    combination: &entry.combination,
                    result,
                    score,
                })
            })
            .collect();
        ranked.sort_by(|a, b| self.objective.compare(a.score, b.score));
        ranked
    }

    /// The top N entries by objective.
    pub fn top_n(&self, n: usize) -> Vec<RankedEntry<'_>> {
        self.ranked().into_iter().take(n).collect()
    }

    /// The best entry; the first-enumerated one wins a tie.
    pub fn best(&self) -> Option<RankedEntry<'_>> {
        self.ranked().into_iter().next()
    }
}
