//! Long-short channel strategy with trailing-extremum exits.
//!
//! Bands come from a [`ChannelSpec`] with separate upper/lower ATR
//! multipliers, anchored either on the EMA of typical price or on the
//! trailing extrema (see [`AnchorMode`]).
//!
//! While flat: close < lower → enter long; close > upper → enter short.
//! While long: close > trailing high of the *previous* bar → exit.
//! While short: close < trailing low of the previous bar → exit.
//!
//! Reading the extremum at t-1 keeps the current bar out of its own exit
//! threshold. Entries need a channel with positive ATR; a zero-width channel
//! has no band to cross.

use super::config::{
    check_known, fraction_param, multiplier_param, window_param, AnchorMode, ConfigurationError,
    ExtremaSource, StrategyConfig,
};
use super::Strategy;
use crate::domain::{Bar, PositionSide, Signal};
use crate::engine::Sizing;
use crate::indicators::{
    BandAnchor, Channel, ChannelSpec, Indicator, IndicatorValues, PriceField, TrailingExtremum,
};

const PARAMS: &[&str] = &[
    "ema_period",
    "atr_period",
    "high_period",
    "low_period",
    "upper_band_multiplier",
    "lower_band_multiplier",
    "long_size",
    "short_size",
];

#[derive(Debug, Clone)]
pub struct LongShort {
    ema_period: usize,
    atr_period: usize,
    high_period: usize,
    low_period: usize,
    anchor: AnchorMode,
    sizing: Sizing,
    spec: ChannelSpec,
    high_field: PriceField,
    low_field: PriceField,
    upper_name: String,
    lower_name: String,
    atr_name: String,
    high_name: String,
    low_name: String,
}

impl LongShort {
    pub fn from_config(config: &StrategyConfig) -> Result<Self, ConfigurationError> {
        check_known(config, PARAMS)?;

        let ema_period = window_param(config, "ema_period", 20)?;
        let atr_period = window_param(config, "atr_period", 5)?;
        let high_period = window_param(config, "high_period", 5)?;
        let low_period = window_param(config, "low_period", 5)?;
        let upper_multiplier = multiplier_param(config, "upper_band_multiplier", 2.25)?;
        let lower_multiplier = multiplier_param(config, "lower_band_multiplier", 2.25)?;
        let sizing = Sizing {
            long_size: fraction_param(config, "long_size", 1.0)?,
            short_size: Some(fraction_param(config, "short_size", 1.0)?),
        };

        let (high_field, low_field) = match config.extrema_source {
            ExtremaSource::HighLow => (PriceField::High, PriceField::Low),
            ExtremaSource::Close => (PriceField::Close, PriceField::Close),
        };

        let anchor = match config.band_anchor {
            AnchorMode::Middle => BandAnchor::Middle { ema_period },
            AnchorMode::Extrema => BandAnchor::Extrema {
                high_period,
                low_period,
                high_field,
                low_field,
            },
        };
        let spec = ChannelSpec {
            anchor,
            atr_period,
            upper_multiplier,
            lower_multiplier,
        };

        Ok(Self {
            ema_period,
            atr_period,
            high_period,
            low_period,
            anchor: config.band_anchor,
            sizing,
            spec,
            high_field,
            low_field,
            upper_name: Channel::upper(spec).name().to_string(),
            lower_name: Channel::lower(spec).name().to_string(),
            atr_name: spec.atr_name(),
            high_name: TrailingExtremum::highest(high_period, high_field)
                .name()
                .to_string(),
            low_name: TrailingExtremum::lowest(low_period, low_field)
                .name()
                .to_string(),
        })
    }

    fn trailing_extrema(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(TrailingExtremum::highest(self.high_period, self.high_field)),
            Box::new(TrailingExtremum::lowest(self.low_period, self.low_field)),
        ]
    }

    /// Extremum from the bar before `bar_index`, if defined.
    fn prior(&self, indicators: &IndicatorValues, name: &str, bar_index: usize) -> Option<f64> {
        bar_index
            .checked_sub(1)
            .and_then(|prev| indicators.get(name, prev))
    }
}

impl Strategy for LongShort {
    fn name(&self) -> &str {
        "long_short"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        let mut indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Channel::upper(self.spec)),
            Box::new(Channel::lower(self.spec)),
        ];
        indicators.extend(self.trailing_extrema());
        indicators
    }

    fn compute_indicators(&self, bars: &[Bar]) -> IndicatorValues {
        let mut values = IndicatorValues::compute_all(bars, &self.trailing_extrema());
        self.spec.insert_into(bars, &mut values);
        values
    }

    fn windows(&self) -> Vec<(&'static str, usize)> {
        let mut windows = vec![
            ("atr_period", self.atr_period),
            ("high_period", self.high_period),
            ("low_period", self.low_period),
        ];
        if self.anchor == AnchorMode::Middle {
            windows.insert(0, ("ema_period", self.ema_period));
        }
        windows
    }

    fn sizing(&self) -> Sizing {
        self.sizing
    }

    fn generate_signal(
        &self,
        bars: &[Bar],
        bar_index: usize,
        indicators: &IndicatorValues,
        side: PositionSide,
    ) -> Signal {
        let close = bars[bar_index].close;

        match side {
            PositionSide::Flat => {
                let (Some(upper), Some(lower), Some(atr)) = (
                    indicators.get(&self.upper_name, bar_index),
                    indicators.get(&self.lower_name, bar_index),
                    indicators.get(&self.atr_name, bar_index),
                ) else {
                    return Signal::None;
                };
                if atr <= 0.0 {
                    Signal::None
                } else if close < lower {
                    Signal::EnterLong
                } else if close > upper {
                    Signal::EnterShort
                } else {
                    Signal::None
                }
            }
            PositionSide::Long => match self.prior(indicators, &self.high_name, bar_index) {
                Some(high) if close > high => Signal::Exit,
                _ => Signal::None,
            },
            PositionSide::Short => match self.prior(indicators, &self.low_name, bar_index) {
                Some(low) if close < low => Signal::Exit,
                _ => Signal::None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{flat_bars, make_bars};
    use crate::strategy::StrategyKind;

    fn config() -> StrategyConfig {
        StrategyConfig::new(StrategyKind::LongShort)
            .with_param("ema_period", 3.0)
            .with_param("atr_period", 3.0)
            .with_param("high_period", 2.0)
            .with_param("low_period", 2.0)
            .with_param("upper_band_multiplier", 1.0)
            .with_param("lower_band_multiplier", 1.0)
    }

    #[test]
    fn enters_both_directions_while_flat() {
        let s = LongShort::from_config(&config()).unwrap();

        let down = make_bars(&[100.0, 100.0, 100.0, 100.0, 80.0]);
        let iv = s.compute_indicators(&down);
        assert_eq!(s.generate_signal(&down, 4, &iv, PositionSide::Flat), Signal::EnterLong);

        let up = make_bars(&[100.0, 100.0, 100.0, 100.0, 120.0]);
        let iv = s.compute_indicators(&up);
        assert_eq!(s.generate_signal(&up, 4, &iv, PositionSide::Flat), Signal::EnterShort);
    }

    #[test]
    fn long_exit_uses_previous_bar_extremum() {
        let s = LongShort::from_config(&config()).unwrap();
        // highs: 101, 101, 101, 104 (bar 3: open 100, close 103)
        let bars = make_bars(&[100.0, 100.0, 100.0, 103.0]);
        let iv = s.compute_indicators(&bars);
        // trailing high at bar 2 is 101; close 103 > 101
        assert_eq!(s.generate_signal(&bars, 3, &iv, PositionSide::Long), Signal::Exit);
        // trailing high including bar 3 would be 104: the current bar is excluded
        assert_eq!(iv.get(&s.high_name, 3), Some(104.0));
    }

    #[test]
    fn short_exit_below_previous_low() {
        let s = LongShort::from_config(&config()).unwrap();
        // lows: 99, 99, 99, 96
        let bars = make_bars(&[100.0, 100.0, 100.0, 97.0]);
        let iv = s.compute_indicators(&bars);
        assert_eq!(s.generate_signal(&bars, 3, &iv, PositionSide::Short), Signal::Exit);
        assert_eq!(s.generate_signal(&bars, 3, &iv, PositionSide::Long), Signal::None);
    }

    #[test]
    fn no_exit_on_first_bar() {
        let s = LongShort::from_config(&config()).unwrap();
        let bars = make_bars(&[100.0, 100.0, 100.0]);
        let iv = s.compute_indicators(&bars);
        assert_eq!(s.generate_signal(&bars, 0, &iv, PositionSide::Long), Signal::None);
    }

    #[test]
    fn zero_width_channel_never_enters() {
        for anchor in [AnchorMode::Middle, AnchorMode::Extrema] {
            let s = LongShort::from_config(&config().with_anchor(anchor)).unwrap();
            for price in [0.01, 1.0842, 101.37, 999.99] {
                let bars = flat_bars(price, 12);
                let iv = s.compute_indicators(&bars);
                for i in 0..bars.len() {
                    assert_eq!(
                        s.generate_signal(&bars, i, &iv, PositionSide::Flat),
                        Signal::None,
                        "{anchor:?} at {price}, bar {i}"
                    );
                }
            }
        }
    }

    #[test]
    fn indicator_set_has_no_middle_band() {
        let s = LongShort::from_config(&config()).unwrap();
        let bars = make_bars(&[100.0, 101.0, 99.5, 102.0, 98.0, 100.5]);
        let iv = s.compute_indicators(&bars);
        // upper, lower, channel ATR, trailing high, trailing low
        assert_eq!(iv.len(), 5);
        assert!(s.indicators().iter().all(|i| !i.name().contains("middle")));
        assert_eq!(
            s.warmup_bars(),
            s.spec.lookback().max(s.high_period - 1).max(s.low_period - 1)
        );
    }

    #[test]
    fn sizing_carries_both_sides() {
        let cfg = config().with_param("long_size", 0.5).with_param("short_size", 0.25);
        let s = LongShort::from_config(&cfg).unwrap();
        assert_eq!(s.sizing().long_size, 0.5);
        assert_eq!(s.sizing().short_size, Some(0.25));
    }

    #[test]
    fn extrema_anchor_drops_ema_window() {
        let s = LongShort::from_config(&config().with_anchor(AnchorMode::Extrema)).unwrap();
        assert!(s.windows().iter().all(|(name, _)| *name != "ema_period"));
    }

    #[test]
    fn rejects_size_above_one() {
        let cfg = config().with_param("short_size", 1.5);
        assert!(matches!(
            LongShort::from_config(&cfg),
            Err(ConfigurationError::SizeOutOfRange { .. })
        ));
    }
}
