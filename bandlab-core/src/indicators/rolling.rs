//! Incremental window state — the primitives every indicator folds over.
//!
//! Each accumulator consumes one value per bar and answers in O(1) amortized
//! time, so a sweep over thousands of combinations never rescans history.
//! `push` returns `None` until the window is full (warm-up).

use std::collections::VecDeque;

/// Simple moving average over the trailing `period` values.
///
/// Keeps a running sum. The sum is rebuilt from the window once every
/// `period` evictions so floating-point drift cannot accumulate over long
/// series; that rebuild is O(period) per `period` pushes.
#[derive(Debug, Clone)]
pub struct RollingMean {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
    evictions: usize,
}

impl RollingMean {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling mean period must be >= 1");
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
            evictions: 0,
        }
    }

    /// Feed the next value. A NaN input clears the window and restarts warm-up.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if value.is_nan() {
            self.window.clear();
            self.sum = 0.0;
            self.evictions = 0;
            return None;
        }

        self.window.push_back(value);
        self.sum += value;
        if self.window.len() > self.period {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
            }
            self.evictions += 1;
            if self.evictions >= self.period {
                self.sum = self.window.iter().sum();
                self.evictions = 0;
            }
        }

        (self.window.len() == self.period).then(|| self.sum / self.period as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Max,
    Min,
}

/// Trailing max or min over `period` values via a monotonic deque.
///
/// The deque holds (index, value) pairs whose values are strictly monotone
/// from front to back, so the front is always the window's extremum. Each
/// value enters and leaves the deque at most once.
#[derive(Debug, Clone)]
pub struct RollingExtremum {
    period: usize,
    kind: Extreme,
    deque: VecDeque<(usize, f64)>,
    /// Values seen since the last reset.
    count: usize,
}

impl RollingExtremum {
    pub fn max(period: usize) -> Self {
        Self::new(period, Extreme::Max)
    }

    pub fn min(period: usize) -> Self {
        Self::new(period, Extreme::Min)
    }

    fn new(period: usize, kind: Extreme) -> Self {
        assert!(period >= 1, "rolling extremum period must be >= 1");
        Self {
            period,
            kind,
            deque: VecDeque::with_capacity(period),
            count: 0,
        }
    }

    /// Feed the next value. A NaN input clears the window and restarts warm-up.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if value.is_nan() {
            self.deque.clear();
            self.count = 0;
            return None;
        }

        let index = self.count;
        self.count += 1;

        while let Some(&(_, back)) = self.deque.back() {
            let dominated = match self.kind {
                Extreme::Max => back <= value,
                Extreme::Min => back >= value,
            };
            if !dominated {
                break;
            }
            self.deque.pop_back();
        }
        self.deque.push_back((index, value));

        while let Some(&(front_index, _)) = self.deque.front() {
            if front_index + self.period > index {
                break;
            }
            self.deque.pop_front();
        }

        if self.count >= self.period {
            self.deque.front().map(|&(_, v)| v)
        } else {
            None
        }
    }
}

/// Exponential smoothing with alpha = 2 / (period + 1), seeded by the simple
/// mean of the first `period` values.
#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    /// Feed the next value. A NaN input clears the state and restarts seeding.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if value.is_nan() {
            *self = Self::new(self.period);
            return None;
        }

        match self.value {
            Some(prev) => {
                let next = self.alpha * value + (1.0 - self.alpha) * prev;
                self.value = Some(next);
            }
            None => {
                self.seed_sum += value;
                self.seen += 1;
                if self.seen == self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
            }
        }
        self.value
    }
}

/// Run an accumulator over a slice, producing a NaN-padded aligned series.
pub fn fold_series(values: &[f64], mut step: impl FnMut(f64) -> Option<f64>) -> Vec<f64> {
    values.iter().map(|&v| step(v).unwrap_or(f64::NAN)).collect()
}
