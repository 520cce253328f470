//! Strategy abstraction — indicator set plus a pure per-bar signal rule.
//!
//! Variants are selected by `StrategyConfig::kind` through [`build_strategy`],
//! not by a class hierarchy. A strategy never tracks position state: the
//! caller supplies the current side on every `generate_signal` call.

pub mod channel_breakout;
pub mod config;
pub mod long_short;

pub use channel_breakout::ChannelBreakout;
pub use config::{AnchorMode, ConfigurationError, ExtremaSource, StrategyConfig, StrategyKind};
pub use long_short::LongShort;

use crate::domain::{Bar, PositionSide, Signal};
use crate::engine::Sizing;
use crate::indicators::{Indicator, IndicatorValues};

pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Indicators the signal rule reads, by name, from `IndicatorValues`.
    fn indicators(&self) -> Vec<Box<dyn Indicator>>;

    /// Named window lengths, checked against the available bar count.
    fn windows(&self) -> Vec<(&'static str, usize)>;

    /// Per-side equity fractions for new positions.
    fn sizing(&self) -> Sizing;

    /// Intent for bar `bar_index` given the caller's current side.
    ///
    /// Must return `Signal::None` whenever an indicator it needs is undefined.
    fn generate_signal(
        &self,
        bars: &[Bar],
        bar_index: usize,
        indicators: &IndicatorValues,
        side: PositionSide,
    ) -> Signal;

    fn compute_indicators(&self, bars: &[Bar]) -> IndicatorValues {
        IndicatorValues::compute_all(bars, &self.indicators())
    }

    /// Bars before every indicator is defined.
    fn warmup_bars(&self) -> usize {
        self.indicators()
            .iter()
            .map(|i| i.lookback())
            .max()
            .unwrap_or(0)
    }

    /// Fail if any window would consume the whole bar sequence.
    fn check_bar_count(&self, bars: usize) -> Result<(), ConfigurationError> {
        match self.windows().into_iter().find(|&(_, w)| w >= bars) {
            Some((name, window)) => Err(ConfigurationError::WindowTooLong {
                name: name.to_string(),
                window,
                bars,
            }),
            None => Ok(()),
        }
    }
}

/// Build the variant named by `config.kind`, validating every parameter.
pub fn build_strategy(config: &StrategyConfig) -> Result<Box<dyn Strategy>, ConfigurationError> {
    match config.kind {
        StrategyKind::ChannelBreakout => Ok(Box::new(ChannelBreakout::from_config(config)?)),
        StrategyKind::LongShort => Ok(Box::new(LongShort::from_config(config)?)),
    }
}
