//! Position manager — maps (position, signal) to a transition.
//!
//! States: Flat, Long, Short.
//! - Flat + EnterLong → open long; Flat + EnterShort → open short.
//! - Long + Exit → close; Long + EnterShort → close (no reversal on the same bar).
//! - Short mirrors Long.
//! - An entry for the side already held is ignored.
//!
//! Sizing: notional = equity * side fraction, capped at equity.

use crate::domain::{Position, PositionSide, Signal};
use serde::{Deserialize, Serialize};

/// Equity fractions for new positions. `short_size = None` disables shorts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sizing {
    pub long_size: f64,
    pub short_size: Option<f64>,
}

impl Sizing {
    pub fn long_only(long_size: f64) -> Self {
        Self {
            long_size,
            short_size: None,
        }
    }

    pub fn fraction(&self, side: PositionSide) -> Option<f64> {
        match side {
            PositionSide::Long => Some(self.long_size),
            PositionSide::Short => self.short_size,
            PositionSide::Flat => None,
        }
    }
}

/// What the execution simulator should do on this bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Hold,
    Open {
        side: PositionSide,
        size: f64,
        notional: f64,
    },
    Close,
}

/// Decide the transition for `signal` given the current position and equity.
pub fn decide(position: &Position, signal: Signal, equity: f64, sizing: &Sizing) -> Transition {
    let wanted = match signal {
        Signal::None => return Transition::Hold,
        Signal::Exit => PositionSide::Flat,
        Signal::EnterLong => PositionSide::Long,
        Signal::EnterShort => PositionSide::Short,
    };

    match (position.side(), wanted) {
        (PositionSide::Flat, PositionSide::Flat) => Transition::Hold,
        (PositionSide::Flat, side) => open(side, equity, sizing),
        (held, wanted) if held == wanted => Transition::Hold,
        // Exit, or an entry on the opposite side: flatten first.
        _ => Transition::Close,
    }
}

fn open(side: PositionSide, equity: f64, sizing: &Sizing) -> Transition {
    let Some(size) = sizing.fraction(side) else {
        return Transition::Hold;
    };
    if equity.is_nan() || equity <= 0.0 {
        return Transition::Hold;
    }
    let notional = (equity * size).min(equity);
    if notional <= 0.0 {
        return Transition::Hold;
    }
    Transition::Open {
        side,
        size,
        notional,
    }
}
