//! Chronological train/test split and single-split validation.
//!
//! The split never shuffles: the training slice is the first
//! `floor(n * train_ratio)` bars and the test slice is the rest.

use serde::{Deserialize, Serialize};

use bandlab_core::domain::Bar;

use crate::metrics::PerformanceMetrics;
use crate::sweep::{Combination, ParamGrid, ParamSweep};
use crate::walk_forward::WalkForwardError;

pub const DEFAULT_TRAIN_RATIO: f64 = 0.75;

/// Split `bars` at `floor(len * train_ratio)`.
pub fn split_bars(bars: &[Bar], train_ratio: f64) -> Result<(&[Bar], &[Bar]), WalkForwardError> {
    if !train_ratio.is_finite() || train_ratio <= 0.0 || train_ratio >= 1.0 {
        return Err(WalkForwardError::InvalidRatio {
            name: "train_ratio",
            value: train_ratio,
        });
    }
    let train_len = (bars.len() as f64 * train_ratio).floor() as usize;
    let (train, test) = bars.split_at(train_len.min(bars.len()));
    if train.is_empty() || test.is_empty() {
        return Err(WalkForwardError::EmptySplit {
            train: train.len(),
            test: test.len(),
        });
    }
    Ok((train, test))
}

/// Outcome of optimizing on one slice and re-running the winner on another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// `None` when no combination could be ranked on the training slice.
    pub best: Option<Combination>,
    pub train_score: Option<f64>,
    pub test_score: Option<f64>,
    pub train_metrics: Option<PerformanceMetrics>,
    pub test_metrics: Option<PerformanceMetrics>,
    /// Why the winner could not run on the test slice, if it could not.
    pub test_error: Option<String>,
    /// Combinations that failed on the training slice.
    pub failure_count: usize,
}

/// Sweep `grid` on `train`, then evaluate the best combination on `test`.
pub fn optimize_and_validate(
    train: &[Bar],
    test: &[Bar],
    sweep: &ParamSweep,
    grid: &ParamGrid,
) -> Result<ValidationReport, WalkForwardError> {
    validate_window(0, train, test, sweep, grid)
}

pub(crate) fn validate_window(
    window: usize,
    train: &[Bar],
    test: &[Bar],
    sweep: &ParamSweep,
    grid: &ParamGrid,
) -> Result<ValidationReport, WalkForwardError> {
    let results = sweep
        .sweep(train, grid)
        .map_err(|source| WalkForwardError::Sweep { window, source })?;
    let failure_count = results.failure_count();

    let Some(best) = results.best() else {
        tracing::debug!(window, failures = failure_count, "no rankable combination");
        return Ok(ValidationReport {
            best: None,
            train_score: None,
            test_score: None,
            train_metrics: None,
            test_metrics: None,
            test_error: None,
            failure_count,
        });
    };

    let objective = sweep.objective();
    let (test_metrics, test_error) = match sweep.run(test, best.combination) {
        Ok(result) => (Some(result.metrics), None),
        Err(e) => {
            tracing::warn!(window, combination = %best.combination, error = %e, "test run failed");
            (None, Some(e.to_string()))
        }
    };
    let test_score = test_metrics.as_ref().and_then(|m| objective.score(m));

    tracing::debug!(
        window,
        combination = %best.combination,
        train_score = best.score,
        test_score = ?test_score,
        "window evaluated"
    );

    Ok(ValidationReport {
        best: Some(best.combination.clone()),
        train_score: Some(best.score),
        test_score,
        train_metrics: Some(best.result.metrics.clone()),
        test_metrics,
        test_error,
        failure_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::FitnessMetric;
    use crate::sweep::ParamAxis;
    use bandlab_core::strategy::{StrategyConfig, StrategyKind};
    use chrono::NaiveDate;

    fn make_bars(n: usize) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| {
                let c = 50.0 + (i as f64 * 0.4).sin() * 4.0;
                Bar {
                    timestamp: base + chrono::Duration::days(i as i64),
                    open: c,
                    high: c + 1.0,
                    low: c - 1.0,
                    close: c,
                    volume: 10.0,
                }
            })
            .collect()
    }

    #[test]
    fn split_is_chronological() {
        let bars = make_bars(100);
        let (train, test) = split_bars(&bars, DEFAULT_TRAIN_RATIO).unwrap();
        assert_eq!(train.len(), 75);
        assert_eq!(test.len(), 25);
        assert!(train.last().unwrap().timestamp < test[0].timestamp);
    }

    #[test]
    fn split_rejects_bad_ratio_and_empty_sides() {
        let bars = make_bars(10);
        assert!(matches!(
            split_bars(&bars, 1.0),
            Err(WalkForwardError::InvalidRatio { .. })
        ));
        assert!(matches!(
            split_bars(&bars, 0.05),
            Err(WalkForwardError::EmptySplit { train: 0, test: 10 })
        ));
    }

    #[test]
    fn best_train_combination_is_rerun_on_test() {
        let bars = make_bars(200);
        let (train, test) = split_bars(&bars, 0.75).unwrap();
        let grid = ParamGrid::new(vec![
            ParamAxis::new("atr_period", vec![3.0, 5.0]),
            ParamAxis::new("high_period", vec![2.0, 4.0]),
        ])
        .unwrap();
        let sweep = ParamSweep::new(
            StrategyConfig::new(StrategyKind::LongShort).with_param("ema_period", 5.0),
            FitnessMetric::TotalReturn,
        );

        let report = optimize_and_validate(train, test, &sweep, &grid).unwrap();
        let best = report.best.as_ref().unwrap();
        let rerun = sweep.run(test, best).unwrap();
        assert_eq!(report.test_metrics.as_ref(), Some(&rerun.metrics));
        assert_eq!(report.test_score, Some(rerun.metrics.total_return));
        assert_eq!(report.failure_count, 0);
    }

    #[test]
    fn test_slice_too_short_is_recorded() {
        let bars = make_bars(60);
        let (train, test) = split_bars(&bars, 0.9).unwrap();
        let grid = ParamGrid::new(vec![ParamAxis::new("atr_period", vec![8.0])]).unwrap();
        let sweep = ParamSweep::new(
            StrategyConfig::new(StrategyKind::ChannelBreakout).with_param("ema_period", 5.0),
            FitnessMetric::TotalReturn,
        );
        let report = optimize_and_validate(train, test, &sweep, &grid).unwrap();
        assert!(report.best.is_some());
        assert!(report.test_metrics.is_none());
        assert!(report.test_error.unwrap().contains("atr_period"));
    }
}
