//! Channel breakout — long-only mean reversion across an EMA/ATR channel.
//!
//! Middle: EMA(typical price, ema_period).
//! Bands: middle ± multiplier * ATR(atr_period).
//! Entry: close < lower while flat. Exit: close > upper while long.
//! Comparisons are strict; touching a band does nothing.
//! A channel with zero ATR has no width and never signals.

use super::config::{
    check_known, fraction_param, multiplier_param, window_param, ConfigurationError,
    StrategyConfig,
};
use super::Strategy;
use crate::domain::{Bar, PositionSide, Signal};
use crate::engine::Sizing;
use crate::indicators::{Channel, ChannelSpec, Indicator, IndicatorValues};

const PARAMS: &[&str] = &["ema_period", "atr_period", "multiplier", "long_size"];

#[derive(Debug, Clone)]
pub struct ChannelBreakout {
    ema_period: usize,
    atr_period: usize,
    long_size: f64,
    spec: ChannelSpec,
    upper_name: String,
    lower_name: String,
    atr_name: String,
}

impl ChannelBreakout {
    pub fn new(ema_period: usize, atr_period: usize, multiplier: f64, long_size: f64) -> Self {
        let spec = ChannelSpec::keltner(ema_period, atr_period, multiplier);
        Self {
            ema_period,
            atr_period,
            long_size,
            upper_name: Channel::upper(spec).name().to_string(),
            lower_name: Channel::lower(spec).name().to_string(),
            atr_name: spec.atr_name(),
            spec,
        }
    }

    pub fn from_config(config: &StrategyConfig) -> Result<Self, ConfigurationError> {
        check_known(config, PARAMS)?;
        Ok(Self::new(
            window_param(config, "ema_period", 20)?,
            window_param(config, "atr_period", 14)?,
            multiplier_param(config, "multiplier", 2.0)?,
            fraction_param(config, "long_size", 1.0)?,
        ))
    }
}

impl Strategy for ChannelBreakout {
    fn name(&self) -> &str {
        "channel_breakout"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Channel::upper(self.spec)),
            Box::new(Channel::lower(self.spec)),
        ]
    }

    fn compute_indicators(&self, bars: &[Bar]) -> IndicatorValues {
        let mut values = IndicatorValues::new();
        self.spec.insert_into(bars, &mut values);
        values
    }

    fn windows(&self) -> Vec<(&'static str, usize)> {
        vec![("ema_period", self.ema_period), ("atr_period", self.atr_period)]
    }

    fn sizing(&self) -> Sizing {
        Sizing::long_only(self.long_size)
    }

    fn generate_signal(
        &self,
        bars: &[Bar],
        bar_index: usize,
        indicators: &IndicatorValues,
        side: PositionSide,
    ) -> Signal {
        let (Some(upper), Some(lower), Some(atr)) = (
            indicators.get(&self.upper_name, bar_index),
            indicators.get(&self.lower_name, bar_index),
            indicators.get(&self.atr_name, bar_index),
        ) else {
            return Signal::None;
        };
        if atr <= 0.0 {
            return Signal::None;
        }
        let close = bars[bar_index].close;

        match side {
            PositionSide::Flat if close < lower => Signal::EnterLong,
            PositionSide::Long if close > upper => Signal::Exit,
            _ => Signal::None,
        }
    }
}
