//! Bar — the fundamental market data unit, plus ingestion validation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single instrument at a single timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Typical price: (high + low + close) / 3.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Returns true if any price field is NaN or infinite.
    pub fn has_non_finite_price(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }
}

/// Rejections raised when a bar sequence is ingested.
///
/// Every variant is fatal to the run it belongs to; nothing is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("bar sequence is empty")]
    Empty,
    #[error("bar {index}: non-finite price")]
    NonFinitePrice { index: usize },
    #[error("bar {index}: volume {volume} is negative or non-finite")]
    InvalidVolume { index: usize, volume: f64 },
    #[error("bar {index}: high {high} < low {low}")]
    HighBelowLow { index: usize, high: f64, low: f64 },
    #[error("bar {index}: open/close outside [low, high]")]
    OutsideRange { index: usize },
    #[error("bar {index}: timestamp {timestamp} does not follow {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: NaiveDateTime,
        timestamp: NaiveDateTime,
    },
}

/// Validate a bar sequence before any simulation starts.
///
/// Checks each bar in order and reports the first violation found.
pub fn validate_bars(bars: &[Bar]) -> Result<(), DataError> {
    if bars.is_empty() {
        return Err(DataError::Empty);
    }

    for (index, bar) in bars.iter().enumerate() {
        if bar.has_non_finite_price() {
            return Err(DataError::NonFinitePrice { index });
        }
        if !bar.volume.is_finite() || bar.volume < 0.0 {
            return Err(DataError::InvalidVolume {
                index,
                volume: bar.volume,
            });
        }
        if bar.high < bar.low {
            return Err(DataError::HighBelowLow {
                index,
                high: bar.high,
                low: bar.low,
            });
        }
        let in_range = |p: f64| p >= bar.low && p <= bar.high;
        if !in_range(bar.open) || !in_range(bar.close) {
            return Err(DataError::OutsideRange { index });
        }
        if index > 0 {
            let previous = bars[index - 1].timestamp;
            if bar.timestamp <= previous {
                return Err(DataError::NonMonotonicTimestamp {
                    index,
                    previous,
                    timestamp: bar.timestamp,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_bar(day: u32) -> Bar {
        Bar {
            timestamp: ts(day),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn typical_price_is_hlc_mean() {
        let bar = sample_bar(2);
        assert!((bar.typical_price() - (105.0 + 98.0 + 103.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn valid_sequence_passes() {
        let bars = vec![sample_bar(2), sample_bar(3), sample_bar(4)];
        assert!(validate_bars(&bars).is_ok());
    }

    #[test]
    fn empty_sequence_rejected() {
        assert_eq!(validate_bars(&[]), Err(DataError::Empty));
    }

    #[test]
    fn nan_price_rejected() {
        let mut bar = sample_bar(2);
        bar.close = f64::NAN;
        assert_eq!(
            validate_bars(&[bar]),
            Err(DataError::NonFinitePrice { index: 0 })
        );
    }

    #[test]
    fn high_below_low_rejected() {
        let mut bar = sample_bar(3);
        bar.high = 97.0;
        let err = validate_bars(&[sample_bar(2), bar]).unwrap_err();
        assert!(matches!(err, DataError::HighBelowLow { index: 1, .. }));
    }

    #[test]
    fn close_outside_range_rejected() {
        let mut bar = sample_bar(2);
        bar.close = 110.0;
        assert_eq!(
            validate_bars(&[bar]),
            Err(DataError::OutsideRange { index: 0 })
        );
    }

    #[test]
    fn negative_volume_rejected() {
        let mut bar = sample_bar(2);
        bar.volume = -1.0;
        assert!(matches!(
            validate_bars(&[bar]),
            Err(DataError::InvalidVolume { index: 0, .. })
        ));
    }

    #[test]
    fn duplicate_timestamp_rejected() {
        let err = validate_bars(&[sample_bar(2), sample_bar(2)]).unwrap_err();
        assert!(matches!(
            err,
            DataError::NonMonotonicTimestamp { index: 1, .. }
        ));
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar(2);
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
