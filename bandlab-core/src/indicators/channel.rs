//! Volatility channel — a trend line with ATR-scaled bands.
//!
//! Two anchorings:
//! - `Middle`: middle = EMA(typical price), upper = middle + upper_mult * ATR,
//!   lower = middle - lower_mult * ATR. With non-negative multipliers,
//!   lower <= middle <= upper once warmed up.
//! - `Extrema`: upper = lowest(low_field) + upper_mult * ATR,
//!   lower = highest(high_field) - lower_mult * ATR, middle = midpoint of
//!   the two extrema. No band ordering is implied.
//!
//! Each band is also exposed as its own `Indicator`. Strategies that read
//! several bands call [`ChannelSpec::insert_into`] instead, which computes
//! the channel once and stores the bands next to the ATR they were built from.

use super::atr::Atr;
use super::ema::ema_of_series;
use super::extrema::{rolling_max, rolling_min, PriceField};
use super::{Indicator, IndicatorValues};
use crate::domain::Bar;

/// Which band of the channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelBand {
    Upper,
    Middle,
    Lower,
}

/// What the bands are offset from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandAnchor {
    Middle {
        ema_period: usize,
    },
    Extrema {
        high_period: usize,
        low_period: usize,
        high_field: PriceField,
        low_field: PriceField,
    },
}

/// Parameters shared by all three bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSpec {
    pub anchor: BandAnchor,
    pub atr_period: usize,
    pub upper_multiplier: f64,
    pub lower_multiplier: f64,
}

impl ChannelSpec {
    /// Symmetric EMA-anchored channel.
    pub fn keltner(ema_period: usize, atr_period: usize, multiplier: f64) -> Self {
        Self {
            anchor: BandAnchor::Middle { ema_period },
            atr_period,
            upper_multiplier: multiplier,
            lower_multiplier: multiplier,
        }
    }

    /// Leading bars for which at least one band is undefined.
    pub fn lookback(&self) -> usize {
        let anchor_lookback = match self.anchor {
            BandAnchor::Middle { ema_period } => ema_period.saturating_sub(1),
            BandAnchor::Extrema {
                high_period,
                low_period,
                ..
            } => high_period.max(low_period).saturating_sub(1),
        };
        anchor_lookback.max(self.atr_period.saturating_sub(1))
    }

    fn key(&self) -> String {
        let anchor = match self.anchor {
            BandAnchor::Middle { ema_period } => format!("ema{ema_period}"),
            BandAnchor::Extrema {
                high_period,
                low_period,
                ..
            } => format!("hl{high_period}x{low_period}"),
        };
        format!(
            "{anchor}_atr{}_{}_{}",
            self.atr_period, self.upper_multiplier, self.lower_multiplier
        )
    }

    /// Name under which [`Self::insert_into`] stores the channel's ATR.
    pub fn atr_name(&self) -> String {
        format!("channel_atr_{}", self.key())
    }

    /// Compute the channel once and store the upper and lower bands under
    /// their `Channel` names, plus the ATR under [`Self::atr_name`].
    pub fn insert_into(&self, bars: &[Bar], values: &mut IndicatorValues) {
        let series = self.compute(bars);
        values.insert(Channel::upper(*self).name, series.upper);
        values.insert(Channel::lower(*self).name, series.lower);
        values.insert(self.atr_name(), series.atr);
    }

    /// Compute all three bands in one pass over the shared inputs.
    pub fn compute(&self, bars: &[Bar]) -> ChannelSeries {
        let atr = Atr::new(self.atr_period.max(1)).compute(bars);

        let (middle, upper_base, lower_base) = match self.anchor {
            BandAnchor::Middle { ema_period } => {
                let typical: Vec<f64> = bars.iter().map(Bar::typical_price).collect();
                let middle = ema_of_series(&typical, ema_period);
                (middle.clone(), middle.clone(), middle)
            }
            BandAnchor::Extrema {
                high_period,
                low_period,
                high_field,
                low_field,
            } => {
                let highs: Vec<f64> = bars.iter().map(|b| high_field.extract(b)).collect();
                let lows: Vec<f64> = bars.iter().map(|b| low_field.extract(b)).collect();
                let highest = rolling_max(&highs, high_period);
                let lowest = rolling_min(&lows, low_period);
                let middle = highest
                    .iter()
                    .zip(&lowest)
                    .map(|(h, l)| (h + l) / 2.0)
                    .collect();
                (middle, lowest, highest)
            }
        };

        let upper = upper_base
            .iter()
            .zip(&atr)
            .map(|(base, a)| base + self.upper_multiplier * a)
            .collect();
        let lower = lower_base
            .iter()
            .zip(&atr)
            .map(|(base, a)| base - self.lower_multiplier * a)
            .collect();

        ChannelSeries {
            upper,
            middle,
            lower,
            atr,
        }
    }
}

/// All three bands, aligned with the input bars.
#[derive(Debug, Clone)]
pub struct ChannelSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
    /// ATR the band offsets were scaled by. Zero means the channel has no width.
    pub atr: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Channel {
    spec: ChannelSpec,
    band: ChannelBand,
    name: String,
}

impl Channel {
    pub fn new(spec: ChannelSpec, band: ChannelBand) -> Self {
        let label = match band {
            ChannelBand::Upper => "upper",
            ChannelBand::Middle => "middle",
            ChannelBand::Lower => "lower",
        };
        Self {
            name: format!("channel_{label}_{}", spec.key()),
            spec,
            band,
        }
    }

    pub fn upper(spec: ChannelSpec) -> Self {
        Self::new(spec, ChannelBand::Upper)
    }

    pub fn middle(spec: ChannelSpec) -> Self {
        Self::new(spec, ChannelBand::Middle)
    }

    pub fn lower(spec: ChannelSpec) -> Self {
        Self::new(spec, ChannelBand::Lower)
    }
}

impl Indicator for Channel {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.spec.lookback()
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let series = self.spec.compute(bars);
        match self.band {
            ChannelBand::Upper => series.upper,
            ChannelBand::Middle => series.middle,
            ChannelBand::Lower => series.lower,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, flat_bars, make_bars, DEFAULT_EPSILON};

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn keltner_bands_are_ordered_once_warm() {
        let bars = make_bars(&zigzag(60));
        let spec = ChannelSpec::keltner(10, 5, 2.0);
        let ch = spec.compute(&bars);
        for i in spec.lookback()..bars.len() {
            assert!(ch.lower[i] <= ch.middle[i], "bar {i}");
            assert!(ch.middle[i] <= ch.upper[i], "bar {i}");
        }
    }

    #[test]
    fn keltner_band_width_is_multiplier_times_atr() {
        let bars = make_bars(&zigzag(30));
        let spec = ChannelSpec::keltner(5, 3, 1.5);
        let ch = spec.compute(&bars);
        let atr = Atr::new(3).compute(&bars);
        for i in spec.lookback()..bars.len() {
            assert_approx(ch.upper[i] - ch.middle[i], 1.5 * atr[i], 1e-9);
            assert_approx(ch.middle[i] - ch.lower[i], 1.5 * atr[i], 1e-9);
        }
    }

    #[test]
    fn warmup_is_max_of_components() {
        let bars = make_bars(&zigzag(30));
        let spec = ChannelSpec::keltner(8, 3, 2.0);
        let upper = Channel::upper(spec).compute(&bars);
        assert_eq!(upper.iter().take_while(|v| v.is_nan()).count(), 7);
        assert_eq!(spec.lookback(), 7);
    }

    #[test]
    fn extrema_anchor_uses_trailing_high_and_low() {
        let bars = make_bars(&zigzag(20));
        let spec = ChannelSpec {
            anchor: BandAnchor::Extrema {
                high_period: 4,
                low_period: 4,
                high_field: PriceField::High,
                low_field: PriceField::Low,
            },
            atr_period: 3,
            upper_multiplier: 1.0,
            lower_multiplier: 2.0,
        };
        let ch = spec.compute(&bars);
        let atr = Atr::new(3).compute(&bars);
        let i = 10;
        let hh = bars[i - 3..=i].iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let ll = bars[i - 3..=i].iter().map(|b| b.low).fold(f64::MAX, f64::min);
        assert_approx(ch.lower[i], hh - 2.0 * atr[i], DEFAULT_EPSILON);
        assert_approx(ch.upper[i], ll + atr[i], DEFAULT_EPSILON);
        assert_approx(ch.middle[i], (hh + ll) / 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn insert_into_matches_single_band_indicators() {
        let bars = make_bars(&zigzag(40));
        let spec = ChannelSpec::keltner(6, 4, 1.25);
        let mut values = IndicatorValues::new();
        spec.insert_into(&bars, &mut values);

        assert_eq!(values.len(), 3);
        let upper = Channel::upper(spec);
        let lower = Channel::lower(spec);
        let atr = Atr::new(4).compute(&bars);
        for i in spec.lookback()..bars.len() {
            assert_eq!(values.get(upper.name(), i), Some(upper.compute(&bars)[i]));
            assert_eq!(values.get(lower.name(), i), Some(lower.compute(&bars)[i]));
            assert_approx(values.get(&spec.atr_name(), i).unwrap(), atr[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn flat_prices_give_zero_atr() {
        let flat = flat_bars(101.37, 12);
        let spec = ChannelSpec::keltner(5, 3, 2.0);
        let ch = spec.compute(&flat);
        for i in spec.lookback()..flat.len() {
            assert_eq!(ch.atr[i], 0.0);
        }
    }

    #[test]
    fn band_names_are_distinct() {
        let spec = ChannelSpec::keltner(20, 14, 2.0);
        let names = [
            Channel::upper(spec).name().to_string(),
            Channel::middle(spec).name().to_string(),
            Channel::lower(spec).name().to_string(),
        ];
        assert_ne!(names[0], names[1]);
        assert_ne!(names[1], names[2]);
    }
}
