//! Strategy configuration — named numeric parameters plus variant selection.
//!
//! A `StrategyConfig` is a plain value: a sweep clones the base config and
//! overrides parameters per combination, so nothing is mutated once a run
//! starts. `BTreeMap` keeps parameter order deterministic for hashing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Which strategy variant to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ChannelBreakout,
    LongShort,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::ChannelBreakout => "channel_breakout",
            StrategyKind::LongShort => "long_short",
        }
    }
}

/// Where the long-short bands are anchored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorMode {
    /// Offset from the EMA of typical price.
    #[default]
    Middle,
    /// Lower band hangs off the trailing high, upper band off the trailing low.
    Extrema,
}

/// Price fields used for the long-short trailing extrema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremaSource {
    /// Trailing high over highs, trailing low over lows.
    #[default]
    HighLow,
    /// Both extrema over closes.
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    #[serde(default)]
    pub band_anchor: AnchorMode,
    #[serde(default)]
    pub extrema_source: ExtremaSource,
}

impl StrategyConfig {
    /// Config for `kind` with every parameter at its default.
    pub fn new(kind: StrategyKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
            band_anchor: AnchorMode::default(),
            extrema_source: ExtremaSource::default(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn with_anchor(mut self, anchor: AnchorMode) -> Self {
        self.band_anchor = anchor;
        self
    }

    pub fn with_extrema_source(mut self, source: ExtremaSource) -> Self {
        self.extrema_source = source;
        self
    }

    /// Exact identity: variant, modes and every parameter value.
    ///
    /// Parameter values are hashed by bit pattern, so 2.0 and 2.0000000001
    /// are distinct configurations.
    pub fn full_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.kind.as_str().as_bytes());
        hasher.update(format!("|{:?}|{:?}", self.band_anchor, self.extrema_source).as_bytes());
        for (name, value) in &self.params {
            hasher.update(b"|");
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(&value.to_bits().to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Invalid strategy parameters or run settings.
///
/// A single run surfaces these to the caller; a sweep records them per
/// combination and keeps going.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("unknown parameter '{name}' for {strategy}")]
    UnknownParameter { strategy: &'static str, name: String },
    #[error("parameter '{name}' must be a positive integer window, got {value}")]
    InvalidWindow { name: String, value: f64 },
    #[error("window '{name}' = {window} needs more than the {bars} available bars")]
    WindowTooLong {
        name: String,
        window: usize,
        bars: usize,
    },
    #[error("multiplier '{name}' must be finite and >= 0, got {value}")]
    InvalidMultiplier { name: String, value: f64 },
    #[error("size fraction '{name}' must be in (0, 1], got {value}")]
    SizeOutOfRange { name: String, value: f64 },
    #[error("initial cash must be finite and > 0, got {0}")]
    InvalidInitialCash(f64),
    #[error("commission rate must be finite and >= 0, got {0}")]
    InvalidCommissionRate(f64),
    #[error("invalid parameter grid: {0}")]
    InvalidGrid(String),
}

// ─── Parameter extraction ────────────────────────────────────────────

/// Reject parameter names the variant does not understand.
pub(crate) fn check_known(
    config: &StrategyConfig,
    known: &[&str],
) -> Result<(), ConfigurationError> {
    match config.params.keys().find(|k| !known.contains(&k.as_str())) {
        Some(name) => Err(ConfigurationError::UnknownParameter {
            strategy: config.kind.as_str(),
            name: name.clone(),
        }),
        None => Ok(()),
    }
}

fn param(config: &StrategyConfig, name: &str, default: f64) -> f64 {
    config.params.get(name).copied().unwrap_or(default)
}

/// Window length: a finite whole number >= 1.
pub(crate) fn window_param(
    config: &StrategyConfig,
    name: &str,
    default: usize,
) -> Result<usize, ConfigurationError> {
    let value = param(config, name, default as f64);
    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 {
        return Err(ConfigurationError::InvalidWindow {
            name: name.to_string(),
            value,
        });
    }
    Ok(value as usize)
}

pub(crate) fn multiplier_param(
    config: &StrategyConfig,
    name: &str,
    default: f64,
) -> Result<f64, ConfigurationError> {
    let value = param(config, name, default);
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigurationError::InvalidMultiplier {
            name: name.to_string(),
            value,
        });
    }
    Ok(value)
}

pub(crate) fn fraction_param(
    config: &StrategyConfig,
    name: &str,
    default: f64,
) -> Result<f64, ConfigurationError> {
    let value = param(config, name, default);
    if !(value > 0.0 && value <= 1.0) {
        return Err(ConfigurationError::SizeOutOfRange {
            name: name.to_string(),
            value,
        });
    }
    Ok(value)
}
