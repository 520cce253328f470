//! Position — at most one open exposure at any simulated instant.
//!
//! `Position` is a value, not a shared mutable object: the execution loop
//! threads it through each bar and the position manager replaces it wholesale
//! on every transition.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Direction of the current exposure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    #[default]
    Flat,
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(&self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
            PositionSide::Flat => 0.0,
        }
    }
}

/// Fields of a non-flat position, fixed at the entry fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub side: PositionSide,
    /// Fraction of equity committed at entry, in (0, 1].
    pub size: f64,
    /// Units held (always positive; direction lives in `side`).
    pub quantity: f64,
    pub entry_bar: usize,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub entry_commission: f64,
}

impl OpenPosition {
    /// Notional at the entry fill.
    pub fn entry_notional(&self) -> f64 {
        self.quantity * self.entry_price
    }

    /// Mark-to-market PnL at `price`, before any exit commission.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.side.sign() * self.quantity * (price - self.entry_price)
    }
}

/// Single-slot position state. Exclusivity holds by construction: there is
/// no representation for simultaneous long and short exposure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Open(OpenPosition),
}

impl Position {
    pub fn side(&self) -> PositionSide {
        match self {
            Position::Flat => PositionSide::Flat,
            Position::Open(open) => open.side,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn as_open(&self) -> Option<&OpenPosition> {
        match self {
            Position::Flat => None,
            Position::Open(open) => Some(open),
        }
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.as_open().map_or(0.0, |open| open.unrealized_pnl(price))
    }
}
